//! 目标URL规范化
//!
//! 将配置中的裸主机名补全为可请求的URL

/// 规范化探测目标
///
/// 以 `http` 开头的目标（含 `https://`）原样保留，
/// 其余目标补全 `http://` 前缀。不做其他改写。
///
/// # 参数
/// * `target` - 原始目标字符串
///
/// # 返回
/// * `String` - 可直接请求的URL
pub fn normalize_target(target: &str) -> String {
    if target.starts_with("http") {
        target.to_string()
    } else {
        format!("http://{}", target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_host_gets_http_prefix() {
        assert_eq!(normalize_target("example.com"), "http://example.com");
        assert_eq!(
            normalize_target("example.com:8080/health"),
            "http://example.com:8080/health"
        );
    }

    #[test]
    fn test_http_url_unchanged() {
        assert_eq!(
            normalize_target("http://example.com"),
            "http://example.com"
        );
    }

    #[test]
    fn test_https_url_unchanged() {
        assert_eq!(
            normalize_target("https://example.com/api"),
            "https://example.com/api"
        );
    }

    #[test]
    fn test_idempotent() {
        let once = normalize_target("example.com");
        let twice = normalize_target(&once);
        assert_eq!(once, twice);
    }
}
