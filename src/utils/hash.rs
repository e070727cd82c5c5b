//! 内容哈希工具
//! favicon 哈希复刻 Shodan 的计算约定，保证与外部哈希库互通

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::io::Cursor;

/// base64 文本的折行宽度（对齐 Python base64.encodebytes 的行为）
const WRAP_WIDTH: usize = 76;

/// 计算 favicon 风格的 MurmurHash3-32 哈希
/// 步骤：标准 base64 编码 → 每 76 字符插入换行 → 末尾追加换行 → MurmurHash3-32(seed=0)
/// 返回有符号 32 位整数的十进制字符串；空输入返回空字符串（永不命中）
pub fn favicon_hash(data: &[u8]) -> String {
    if data.is_empty() {
        return String::new();
    }

    let encoded = STANDARD.encode(data);
    let mut wrapped = String::with_capacity(encoded.len() + encoded.len() / WRAP_WIDTH + 2);
    for (index, ch) in encoded.chars().enumerate() {
        wrapped.push(ch);
        if (index + 1) % WRAP_WIDTH == 0 {
            wrapped.push('\n');
        }
    }
    wrapped.push('\n');

    // 内存数据读取不会失败，错误分支仅为满足 Read 接口
    let digest = murmur3::murmur3_32(&mut Cursor::new(wrapped.as_bytes()), 0).unwrap_or_default();
    (digest as i32).to_string()
}

/// 计算 MD5 哈希（小写十六进制）；空输入返回空字符串
pub fn md5_hex(data: &[u8]) -> String {
    if data.is_empty() {
        return String::new();
    }
    format!("{:x}", md5::compute(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favicon_hash_known_vector() {
        // "hello" base64 -> "aGVsbG8=", 追加换行 -> "aGVsbG8=\n"
        assert_eq!(favicon_hash(b"hello"), "1155597304");
    }

    #[test]
    fn test_favicon_hash_wraps_long_input() {
        // 100 字节编码为 136 个 base64 字符，触发一次 76 列折行
        let data: Vec<u8> = (0u8..100).collect();
        assert_eq!(favicon_hash(&data), "-1165240594");
    }

    #[test]
    fn test_favicon_hash_is_deterministic() {
        let data = b"\x00\x01\x02icon-bytes";
        assert_eq!(favicon_hash(data), favicon_hash(data));
    }

    #[test]
    fn test_md5_known_vector() {
        assert_eq!(md5_hex(b"hello"), "5d41402abc4b2a76b9719d911017c592");
    }

    #[test]
    fn test_empty_input_yields_empty_hash() {
        assert_eq!(favicon_hash(b""), "");
        assert_eq!(md5_hex(b""), "");
    }
}
