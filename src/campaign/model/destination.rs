//! 收款地址
//!
//! 地址格式为 `0x` + 40 位十六进制（20 字节），共 42 个字符

use anyhow::Context;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// 地址长度（含 `0x` 前缀）
pub const ADDRESS_LEN: usize = 42;

/// 经过校验的收款地址
///
/// 保留原始书写形式用于请求；相等性按解码后的字节比较，与大小写无关
#[derive(Debug, Clone)]
pub struct Destination {
    text: String,
    bytes: [u8; 20],
}

impl Destination {
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl PartialEq for Destination {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Destination {}

impl std::hash::Hash for Destination {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

/// 地址解析错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    MissingPrefix,
    InvalidLength(usize),
    InvalidHex,
}

impl std::fmt::Display for AddressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPrefix => write!(f, "缺少 0x 前缀"),
            Self::InvalidLength(len) => write!(f, "长度应为 {}，实际为 {}", ADDRESS_LEN, len),
            Self::InvalidHex => write!(f, "包含非十六进制字符"),
        }
    }
}

impl std::error::Error for AddressError {}

impl FromStr for Destination {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s.strip_prefix("0x").ok_or(AddressError::MissingPrefix)?;
        if s.len() != ADDRESS_LEN {
            return Err(AddressError::InvalidLength(s.len()));
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(hex_part, &mut bytes).map_err(|_| AddressError::InvalidHex)?;

        Ok(Self {
            text: s.to_string(),
            bytes,
        })
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// 地址列表的解析结果
#[derive(Debug, Default)]
pub struct DestinationList {
    pub accepted: Vec<Destination>,
    pub rejected: Vec<String>,
}

/// 解析地址列表（每行一个，空行跳过），每个无效地址记录一条警告
pub fn parse_destinations(content: &str) -> DestinationList {
    let mut list = DestinationList::default();

    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match line.parse::<Destination>() {
            Ok(dest) => list.accepted.push(dest),
            Err(e) => {
                tracing::warn!("Warning: 地址无效 - {} ({})", line, e);
                list.rejected.push(line.to_string());
            }
        }
    }

    list
}

/// 从文件加载地址列表
pub fn load_destinations<P: AsRef<Path>>(path: P) -> anyhow::Result<DestinationList> {
    let path = path.as_ref();
    let content =
        fs::read_to_string(path).with_context(|| format!("读取地址文件失败: {:?}", path))?;
    Ok(parse_destinations(&content))
}
