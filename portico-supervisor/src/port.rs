//! Readiness polling for a TCP port.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

use portico_core::PortWaitPolicy;

use crate::error::TimeoutError;

/// Upper bound for a single connection attempt.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Poll `host:port` until a TCP connection succeeds.
///
/// Makes at most `policy.attempts` attempts (at least one), sleeping
/// `policy.interval` between failures. No backoff.
pub async fn wait_for_port(
    host: &str,
    port: u16,
    policy: PortWaitPolicy,
) -> Result<(), TimeoutError> {
    let attempts = policy.attempts.max(1);
    let mut remaining = attempts;

    loop {
        match timeout(CONNECT_TIMEOUT, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => {
                drop(stream);
                tracing::info!(host, port, "port is accepting connections");
                return Ok(());
            }
            Ok(Err(err)) => {
                tracing::debug!(host, port, remaining, error = %err, "port not ready");
            }
            Err(_) => {
                tracing::debug!(host, port, remaining, "connect attempt timed out");
            }
        }

        remaining -= 1;
        if remaining == 0 {
            return Err(TimeoutError {
                host: host.to_string(),
                port,
                attempts,
            });
        }
        tokio::time::sleep(policy.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(attempts: u32) -> PortWaitPolicy {
        PortWaitPolicy {
            attempts,
            interval: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn open_port_succeeds_immediately() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("addr").port();
        wait_for_port("127.0.0.1", port, policy(1))
            .await
            .expect("port open");
    }

    #[tokio::test]
    async fn closed_port_times_out_after_all_attempts() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let err = wait_for_port("127.0.0.1", port, policy(3))
            .await
            .unwrap_err();
        assert_eq!(err.port, port);
        assert_eq!(err.attempts, 3);
    }

    #[tokio::test]
    async fn attempts_are_spaced_by_a_fixed_interval() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let interval = Duration::from_millis(200);
        let started = std::time::Instant::now();
        wait_for_port(
            "127.0.0.1",
            port,
            PortWaitPolicy {
                attempts: 3,
                interval,
            },
        )
        .await
        .unwrap_err();
        let elapsed = started.elapsed();
        // Two sleeps between three attempts, none after the last.
        assert!(elapsed >= interval * 2, "returned after {elapsed:?}");
        assert!(elapsed < interval * 3, "returned after {elapsed:?}");
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("addr").port();
        wait_for_port("127.0.0.1", port, policy(0))
            .await
            .expect("single attempt");
    }
}
