//! Host liveness probing and CIDR expansion.
//!
//! Pre-filters scan targets with plain TCP connects before any HTTP
//! traffic is generated. A host is live when at least one probed port
//! accepts a connection within the timeout; refused, timed-out and
//! errored connects all count as "not open", never as failures.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

/// Check whether `host` accepts a TCP connection on any of `ports`.
///
/// Short-circuits true on the first successful connect. No error escapes.
pub async fn is_alive(host: &str, ports: &[u16], connect_timeout: Duration) -> bool {
    for &port in ports {
        // Hostnames resolve inside connect; a DNS failure is "not open",
        // same as refused or timed out.
        if let Ok(Ok(_)) = timeout(connect_timeout, TcpStream::connect((host, port))).await {
            return true;
        }
    }
    false
}

/// Liveness-filter a host list with a bounded worker pool.
///
/// Spawns `min(concurrency, hosts.len())` workers over a shared cursor;
/// every live host appears exactly once in the output, dead hosts never.
/// Output order is not related to input order.
pub async fn filter_live(
    hosts: Vec<String>,
    ports: Vec<u16>,
    concurrency: usize,
    connect_timeout: Duration,
) -> Vec<String> {
    if hosts.is_empty() {
        return Vec::new();
    }
    let worker_count = concurrency.max(1).min(hosts.len());
    let hosts = Arc::new(hosts);
    let ports = Arc::new(ports);
    let cursor = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        let hosts = Arc::clone(&hosts);
        let ports = Arc::clone(&ports);
        let cursor = Arc::clone(&cursor);
        handles.push(tokio::spawn(async move {
            let mut live = Vec::new();
            loop {
                let idx = cursor.fetch_add(1, Ordering::SeqCst);
                if idx >= hosts.len() {
                    break;
                }
                let host = &hosts[idx];
                if is_alive(host, &ports, connect_timeout).await {
                    live.push(host.clone());
                }
            }
            live
        }));
    }

    let mut all = Vec::new();
    for handle in handles {
        if let Ok(live) = handle.await {
            all.extend(live);
        }
    }
    all
}

/// Expand an IPv4 CIDR block to its usable host addresses.
///
/// Network and broadcast addresses are excluded for prefixes up to /30;
/// /31 yields both addresses (point-to-point) and /32 the single address.
/// Prefixes shorter than /16 are rejected — a 65k-host sweep is already
/// generous, and anything wider would materialize millions of addresses
/// before the liveness filter sees them.
pub fn expand_cidr(cidr: &str) -> Result<Vec<Ipv4Addr>, String> {
    let (base, prefix) = cidr
        .split_once('/')
        .ok_or_else(|| format!("invalid CIDR '{cidr}': missing prefix"))?;

    let base: Ipv4Addr = base
        .trim()
        .parse()
        .map_err(|_| format!("invalid CIDR '{cidr}': bad network address"))?;
    let prefix: u8 = prefix
        .trim()
        .parse()
        .map_err(|_| format!("invalid CIDR '{cidr}': bad prefix"))?;
    if prefix > 32 {
        return Err(format!("invalid CIDR '{cidr}': prefix must be 0-32"));
    }
    if prefix < 16 {
        return Err(format!(
            "refusing to expand '{cidr}': prefixes shorter than /16 are not supported"
        ));
    }

    let base_u32 = u32::from(base);
    let mask = !((1u64 << (32 - prefix)) - 1) as u32;
    let network = base_u32 & mask;
    let broadcast = network | !mask;

    let (start, end) = match prefix {
        32 => (network, network),
        31 => (network, broadcast),
        _ => (network + 1, broadcast - 1),
    };

    Ok((start..=end).map(Ipv4Addr::from).collect())
}
