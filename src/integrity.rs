//! Hash-chain integrity checks
//!
//! A [`ChainedBlock`] carries its own digest. [`is_valid`] recomputes the
//! digest from the block's fields and compares it with the stored one. It
//! never mutates the block and has no error outcome.
//!
//! The digest is the lower-case hex SHA-256 of the concatenation
//! `index ++ timestamp ++ json(transactions) ++ previous_hash`, where the index
//! is rendered in decimal and the transactions as compact JSON (`[]` when
//! empty). The JSON follows JavaScript's `JSON.stringify`: object keys keep
//! their document order and numbers print like `Number.prototype.toString`
//! (`1.0` as `1`, `1e21` as `1e+21`).

use crate::error::{LabError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use sha2::{Digest, Sha256};
use std::io;

/// Conventional `previous_hash` of a genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainedBlock {
    pub index: u64,
    pub timestamp: String,
    pub transactions: Vec<serde_json::Value>,
    pub previous_hash: String,
    pub current_hash: String,
}

impl ChainedBlock {
    /// Build a block whose `current_hash` matches its contents.
    pub fn sealed(
        index: u64,
        timestamp: impl Into<String>,
        transactions: Vec<serde_json::Value>,
        previous_hash: impl Into<String>,
    ) -> Self {
        let timestamp = timestamp.into();
        let previous_hash = previous_hash.into();
        let current_hash = compute_hash(index, &timestamp, &transactions, &previous_hash);
        ChainedBlock {
            index,
            timestamp,
            transactions,
            previous_hash,
            current_hash,
        }
    }

    /// Genesis block stamped with the current UTC time.
    pub fn genesis(transactions: Vec<serde_json::Value>) -> Self {
        Self::sealed(
            0,
            chrono::Utc::now().to_rfc3339(),
            transactions,
            GENESIS_PREVIOUS_HASH,
        )
    }

    /// Successor of `prev`, linked through `prev.current_hash`.
    pub fn next(prev: &ChainedBlock, timestamp: impl Into<String>, transactions: Vec<serde_json::Value>) -> Self {
        Self::sealed(
            prev.index.saturating_add(1),
            timestamp,
            transactions,
            prev.current_hash.clone(),
        )
    }

    pub fn expected_hash(&self) -> String {
        compute_hash(self.index, &self.timestamp, &self.transactions, &self.previous_hash)
    }
}

/// Compact formatter that writes floating point numbers in JavaScript notation.
struct JsNumberFormatter;

impl Formatter for JsNumberFormatter {
    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(js_number(value).as_bytes())
    }
}

/// Render a finite `f64` the way `Number.prototype.toString` does.
pub fn js_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }

    // Shortest round-trip digits, e.g. "1.2345e3".
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let n = exponent.parse::<i32>().unwrap_or(0) + 1;

    let body = if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int_part, frac_part) = digits.split_at(n as usize);
        format!("{}.{}", int_part, frac_part)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let (first, rest) = digits.split_at(1);
        let sign = if n > 0 { '+' } else { '-' };
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, (n - 1).abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, (n - 1).abs())
        }
    };

    if value < 0.0 {
        format!("-{}", body)
    } else {
        body
    }
}

/// Canonical text of a transaction sequence.
pub fn canonical_transactions(transactions: &[serde_json::Value]) -> String {
    let mut out = Vec::with_capacity(64);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, JsNumberFormatter);
    // Writing `Value`s into a Vec cannot fail.
    if transactions.serialize(&mut serializer).is_err() {
        return "[]".to_string();
    }
    String::from_utf8(out).unwrap_or_else(|_| "[]".to_string())
}

pub fn compute_hash(
    index: u64,
    timestamp: &str,
    transactions: &[serde_json::Value],
    previous_hash: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(index.to_string().as_bytes());
    hasher.update(timestamp.as_bytes());
    hasher.update(canonical_transactions(transactions).as_bytes());
    hasher.update(previous_hash.as_bytes());
    hex::encode(hasher.finalize())
}

/// True iff `block.current_hash` equals the digest of the block's fields.
/// Hex comparison ignores case.
pub fn is_valid(block: &ChainedBlock) -> bool {
    block.expected_hash().eq_ignore_ascii_case(&block.current_hash)
}

/// Judge many blocks independently and in parallel. Verdicts keep input order.
pub fn validate_blocks(blocks: &[ChainedBlock]) -> Vec<bool> {
    blocks.par_iter().map(is_valid).collect()
}

/// Walk a whole chain: every block must be self-consistent, indices must
/// increase by one and each `previous_hash` must name its predecessor.
pub fn validate_chain(blocks: &[ChainedBlock]) -> Result<()> {
    for (position, block) in blocks.iter().enumerate() {
        if !is_valid(block) {
            return Err(LabError::InvalidBlock(format!(
                "Hash mismatch at block {}. Expected {}, but got {}.",
                block.index,
                block.expected_hash(),
                block.current_hash
            )));
        }

        if position == 0 {
            continue;
        }

        let prev = &blocks[position - 1];
        if block.index != prev.index.saturating_add(1) {
            return Err(LabError::InvalidBlock(format!(
                "Invalid block index. Expected {}, but got {}.",
                prev.index.saturating_add(1),
                block.index
            )));
        }

        if !block.previous_hash.eq_ignore_ascii_case(&prev.current_hash) {
            return Err(LabError::InvalidBlockLinkage);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_genesis_example() {
        let block = ChainedBlock::sealed(0, "t", vec![], "0");
        assert!(is_valid(&block));

        let mut tampered = block.clone();
        tampered.timestamp = "t2".to_string();
        assert!(!is_valid(&tampered));
    }

    #[test]
    fn test_known_digest() {
        // sha256("0t[]0")
        let expected = hex::encode(Sha256::digest(b"0t[]0"));
        assert_eq!(compute_hash(0, "t", &[], "0"), expected);
    }

    #[test]
    fn test_uppercase_hash_accepted() {
        let mut block = ChainedBlock::sealed(3, "ts", vec![json!({"from": "a", "to": "b", "amount": 5})], "abc");
        block.current_hash = block.current_hash.to_uppercase();
        assert!(is_valid(&block));
    }

    #[test]
    fn test_every_field_participates() {
        let block = ChainedBlock::sealed(1, "2024-01-01", vec![json!("tx1"), json!(2)], "prev");

        let mut b = block.clone();
        b.index = 2;
        assert!(!is_valid(&b));

        let mut b = block.clone();
        b.transactions.push(json!(null));
        assert!(!is_valid(&b));

        let mut b = block.clone();
        b.transactions.swap(0, 1);
        assert!(!is_valid(&b));

        let mut b = block.clone();
        b.previous_hash.push('x');
        assert!(!is_valid(&b));

        let mut b = block.clone();
        b.current_hash.replace_range(0..1, if block.current_hash.starts_with('0') { "1" } else { "0" });
        assert!(!is_valid(&b));
    }

    #[test]
    fn test_empty_transactions_still_hashed() {
        assert_eq!(canonical_transactions(&[]), "[]");
        assert_ne!(compute_hash(0, "t", &[], "0"), compute_hash(0, "t", &[json!([])], "0"));
    }

    #[test]
    fn test_validate_chain() {
        let genesis = ChainedBlock::sealed(0, "t0", vec![], GENESIS_PREVIOUS_HASH);
        let b1 = ChainedBlock::next(&genesis, "t1", vec![json!("a")]);
        let b2 = ChainedBlock::next(&b1, "t2", vec![json!("b")]);
        let chain = vec![genesis.clone(), b1.clone(), b2.clone()];
        assert!(validate_chain(&chain).is_ok());
        assert!(validate_chain(&[]).is_ok());

        // A self-consistent block that points at the wrong parent
        let orphan = ChainedBlock::sealed(2, "t2", vec![json!("b")], "deadbeef");
        assert_eq!(
            validate_chain(&[genesis.clone(), b1.clone(), orphan]),
            Err(LabError::InvalidBlockLinkage)
        );

        let skipped = ChainedBlock::sealed(5, "t2", vec![], b1.current_hash.clone());
        assert!(matches!(
            validate_chain(&[genesis.clone(), b1.clone(), skipped]),
            Err(LabError::InvalidBlock(_))
        ));

        let mut tampered = b2;
        tampered.transactions = vec![json!("evil")];
        assert!(matches!(
            validate_chain(&[genesis, b1, tampered]),
            Err(LabError::InvalidBlock(_))
        ));
    }

    #[test]
    fn test_js_number_notation() {
        let cases = [
            (1.0, "1"),
            (-2.0, "-2"),
            (-0.0, "0"),
            (2.5, "2.5"),
            (0.1, "0.1"),
            (123.456, "123.456"),
            (0.000001, "0.000001"),
            (1e-7, "1e-7"),
            (1.5e-10, "1.5e-10"),
            (1e20, "100000000000000000000"),
            (1e21, "1e+21"),
            (1.2345e25, "1.2345e+25"),
        ];
        for (value, expected) in cases {
            assert_eq!(js_number(value), expected, "rendering {}", value);
        }
    }

    #[test]
    fn test_canonical_keeps_key_order_and_js_numbers() {
        let transactions: Vec<serde_json::Value> =
            serde_json::from_str(r#"[{"to":"b","from":"a","amount":5.0},1.50,-0.0,7]"#).unwrap();
        assert_eq!(
            canonical_transactions(&transactions),
            r#"[{"to":"b","from":"a","amount":5},1.5,0,7]"#
        );
    }

    #[test]
    fn test_validate_blocks_matches_is_valid() {
        let good = ChainedBlock::sealed(0, "t", vec![], "0");
        let mut bad = good.clone();
        bad.timestamp = "t2".into();
        let blocks = vec![good.clone(), bad, good];
        assert_eq!(validate_blocks(&blocks), vec![true, false, true]);
    }

    #[test]
    fn test_block_json_roundtrip_keeps_validity() {
        let block = ChainedBlock::genesis(vec![json!({"voter": "v1", "choice": 0})]);
        let text = serde_json::to_string(&block).unwrap();
        let parsed: ChainedBlock = serde_json::from_str(&text).unwrap();
        assert!(is_valid(&parsed));
    }
}
