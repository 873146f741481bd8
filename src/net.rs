use std::io;
use std::net::{IpAddr, TcpStream};

/// Returns the local and remote address strings of a connected socket.
///
/// The strings are suitable as the source and target host of a
/// transfer request. IPv4-mapped IPv6 addresses are reported in dotted
/// IPv4 form.
///
/// # Errors
///
/// Returns the underlying error if the socket is not connected.
///
/// # Examples
///
/// ```no_run
/// use std::net::TcpStream;
///
/// let stream = TcpStream::connect("files.example.org:22")?;
/// let (local, remote) = dlog::socket_ips(&stream)?;
/// println!("{} -> {}", local, remote);
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn socket_ips(stream: &TcpStream) -> io::Result<(String, String)> {
    let local = stream.local_addr()?.ip();
    let remote = stream.peer_addr()?.ip();
    Ok((display_ip(local), display_ip(remote)))
}

fn display_ip(ip: IpAddr) -> String {
    match ip {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6.to_string(),
        },
        IpAddr::V4(v4) => v4.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr, TcpListener};

    #[test]
    fn loopback_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();

        assert_eq!(
            socket_ips(&client).unwrap(),
            ("127.0.0.1".to_string(), "127.0.0.1".to_string())
        );
        assert!(socket_ips(&server).is_ok());
    }

    #[test]
    fn mapped_addresses_are_dotted() {
        let mapped = IpAddr::V6(Ipv4Addr::new(10, 0, 0, 5).to_ipv6_mapped());
        assert_eq!(display_ip(mapped), "10.0.0.5");
        assert_eq!(display_ip(IpAddr::V6(Ipv6Addr::LOCALHOST)), "::1");
    }
}
