//! ペイロードの内容ハッシュ
//!
//! ペイロードを正規化した JSON（オブジェクトのキーは昇順、空白なし）に
//! シリアライズし、その SHA-256 を取ります。`null` は `{}` として扱います。

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::traits::ContentHash;

/// ペイロードの内容ハッシュを計算
///
/// # 例
///
/// ```rust
/// use tracebound::ledger::hash::content_hash;
/// use serde_json::json;
///
/// let a = content_hash(&json!({ "b": 1, "a": 2 })).unwrap();
/// let b = content_hash(&json!({ "a": 2, "b": 1 })).unwrap();
/// assert_eq!(a, b);
/// ```
pub fn content_hash<T: Serialize + ?Sized>(payload: &T) -> Result<ContentHash, serde_json::Error> {
    let bytes = canonical_bytes(payload)?;
    Ok(ContentHash::from_bytes(Sha256::digest(&bytes).into()))
}

/// 正規化したシリアライズ結果
///
/// `serde_json::Map` はキー順に並ぶため、`Value` を経由すると
/// 構造体のフィールド順や挿入順に依存しない表現になります。
pub fn canonical_bytes<T: Serialize + ?Sized>(payload: &T) -> Result<Vec<u8>, serde_json::Error> {
    let value = match serde_json::to_value(payload)? {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::to_vec(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hash_is_deterministic() {
        let payload = json!({ "intents": [{ "id": "intent-1", "summary": "Do X" }] });
        assert_eq!(content_hash(&payload).unwrap(), content_hash(&payload).unwrap());
    }

    #[test]
    fn test_key_order_does_not_matter() {
        #[derive(Serialize)]
        struct Forward {
            alpha: u8,
            beta: u8,
        }
        #[derive(Serialize)]
        struct Reverse {
            beta: u8,
            alpha: u8,
        }
        let a = content_hash(&Forward { alpha: 1, beta: 2 }).unwrap();
        let b = content_hash(&Reverse { beta: 2, alpha: 1 }).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_null_hashes_as_empty_object() {
        assert_eq!(
            content_hash(&Value::Null).unwrap(),
            content_hash(&json!({})).unwrap()
        );
        assert_eq!(canonical_bytes(&Value::Null).unwrap(), b"{}".to_vec());
    }

    #[test]
    fn test_different_payloads_differ() {
        let a = content_hash(&json!({ "status": "clean" })).unwrap();
        let b = content_hash(&json!({ "status": "blocked" })).unwrap();
        assert_ne!(a, b);
    }
}
