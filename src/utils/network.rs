// 行首是本地回环地址的（服务器内部的dummy连接）
pub fn starts_with_loopback(line: &str) -> bool {
    line.starts_with("::1") || line.starts_with("127.0.0.1")
}

// 本地或者内网的IP，不值得去查询地理位置。
// 只按"192."前缀粗略判断，不是严格的CIDR检查
pub fn is_local_ip(ip: &str) -> bool {
    ip == "127.0.0.1" || ip.starts_with("192.")
}

// 四段、每一段都在0~255之间的IPv4地址，允许前导0（例如010.000.000.001）
pub fn is_valid_ipv4(ip: &str) -> bool {
    let octets: Vec<&str> = ip.split('.').collect();
    octets.len() == 4 &&
        octets.iter().all(|octet| {
            !octet.is_empty() && octet.bytes().all(|b| b.is_ascii_digit()) && octet.parse::<u8>().is_ok()
        })
}
