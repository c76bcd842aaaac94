//! 转账请求与响应

use serde::Serialize;
use serde_json::Value;

use super::account::Account;
use super::destination::Destination;

/// 一笔待执行的转账
#[derive(Debug, Clone, Copy)]
pub struct TransferRequest<'a> {
    pub account: &'a Account,
    pub destination: &'a Destination,
    pub amount: f64,
}

impl<'a> TransferRequest<'a> {
    pub fn new(account: &'a Account, destination: &'a Destination, amount: f64) -> Self {
        Self {
            account,
            destination,
            amount,
        }
    }

    /// 构建请求体
    pub fn body(&self) -> TransferBody<'a> {
        TransferBody {
            to_address: self.destination.as_str(),
            amount: self.amount,
            user_id: &self.account.user_id,
        }
    }
}

/// 转账接口请求体
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferBody<'a> {
    pub to_address: &'a str,
    pub amount: f64,
    pub user_id: &'a str,
}

/// 转账接口响应体
///
/// 先按 JSON 值解析，再宽松地取出各字段：`success=true` 时无论 `data` 的结构如何都算成功
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferResponse {
    pub success: bool,
    pub message: Option<String>,
    pub transfer_data: TransferData,
}

impl TransferResponse {
    /// 解析响应体，只有不是 JSON 对象时才返回错误
    pub fn parse(body: &str) -> Result<Self, String> {
        let value: Value = serde_json::from_str(body).map_err(|e| e.to_string())?;
        if !value.is_object() {
            return Err(format!("响应体不是 JSON 对象: {}", value));
        }

        let transfer = value.pointer("/data/transferData");
        let field = |name: &str| transfer.and_then(|t| t.get(name)).map(value_to_string);

        Ok(Self {
            success: value.get("success").and_then(Value::as_bool).unwrap_or(false),
            message: value
                .get("message")
                .filter(|m| !m.is_null())
                .map(value_to_string),
            transfer_data: TransferData {
                hash: field("hash").unwrap_or_default(),
                status: field("status").unwrap_or_default(),
                nonce: field("nonce").unwrap_or_default(),
            },
        })
    }
}

/// 链上交易信息
///
/// 字段类型随服务端版本变化，标量统一转为字符串，无法读取的字段为空串
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferData {
    pub hash: String,
    pub status: String,
    pub nonce: String,
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_serialization() {
        let account = Account::new("user-7", "sid=x");
        let dest: Destination = format!("0x{}", "ab".repeat(20)).parse().unwrap();
        let request = TransferRequest::new(&account, &dest, 0.001);

        let json = serde_json::to_value(request.body()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "toAddress": dest.as_str(),
                "amount": 0.001,
                "userId": "user-7"
            })
        );
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "success": true,
            "message": "ok",
            "data": { "transferData": { "hash": "0x01", "status": 1, "nonce": "9" } }
        }"#;
        let resp = TransferResponse::parse(body).unwrap();
        assert!(resp.success);
        assert_eq!(resp.message.as_deref(), Some("ok"));
        assert_eq!(resp.transfer_data.hash, "0x01");
        assert_eq!(resp.transfer_data.status, "1");
        assert_eq!(resp.transfer_data.nonce, "9");
    }

    #[test]
    fn test_response_without_data() {
        let resp =
            TransferResponse::parse(r#"{"success":false,"message":"nope","data":null}"#).unwrap();
        assert!(!resp.success);
        assert_eq!(resp.message.as_deref(), Some("nope"));
        assert_eq!(resp.transfer_data, TransferData::default());
    }

    #[test]
    fn test_unexpected_field_types_are_tolerated() {
        let resp = TransferResponse::parse(
            r#"{"success":true,"data":{"transferData":{"hash":12345,"status":{"code":1},"nonce":null}}}"#,
        )
        .unwrap();
        assert!(resp.success);
        assert_eq!(resp.transfer_data.hash, "12345");
        assert_eq!(resp.transfer_data.status, "");
        assert_eq!(resp.transfer_data.nonce, "");

        let resp = TransferResponse::parse(r#"{"success":true,"data":"queued"}"#).unwrap();
        assert!(resp.success);
        assert_eq!(resp.transfer_data, TransferData::default());

        let resp = TransferResponse::parse(r#"{"success":false,"message":500}"#).unwrap();
        assert_eq!(resp.message.as_deref(), Some("500"));
    }

    #[test]
    fn test_non_object_body_is_error() {
        assert!(TransferResponse::parse("<html>oops</html>").is_err());
        assert!(TransferResponse::parse(r#"["success"]"#).is_err());
    }
}
