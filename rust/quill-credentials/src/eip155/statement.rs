//! The human-readable message a wallet is asked to sign.
//!
//! Wallets display `personal_sign` messages to the user verbatim, so an
//! account never signs raw canonical bytes. It signs a statement listing
//! the payload's fields, closed by a digest of the exact bytes. The digest
//! binds the statement to one payload; the field lines are what the user
//! reads before approving.

use quill_common::Blake3Hash;
use quill_varsig::{CanonicalCodec, Field};
use std::fmt::Write;

/// Key derivation context for the payload digest line.
const STATEMENT_CONTEXT: &str = "quill 2024 account statement";

/// Render the statement an account signs in place of `payload`.
///
/// Canonical payloads are listed field by field. Anything else (such as a
/// bare challenge) is shown as hex.
#[must_use]
pub fn signing_statement(payload: &[u8]) -> Vec<u8> {
    let mut statement = String::new();
    match CanonicalCodec.from_slice(payload) {
        Ok(decoded) => {
            let _ = writeln!(
                statement,
                "quill wants you to sign a {} with your Ethereum account.\n",
                decoded.domain().escape_debug()
            );
            for (name, value) in decoded.fields() {
                render(&mut statement, &format!("{}:", name.escape_debug()), value, 0);
            }
        }
        Err(_) => {
            let _ = writeln!(statement, "quill wants you to sign a message with your Ethereum account.\n");
            let _ = writeln!(statement, "message: 0x{}", hex::encode(payload));
        }
    }
    let _ = write!(
        statement,
        "\ndigest: {}",
        Blake3Hash::derive(STATEMENT_CONTEXT, payload)
    );
    statement.into_bytes()
}

/// Write one field as `label value`, where `label` is `name:` for a
/// top-level field and `-` for a list item.
fn render(out: &mut String, label: &str, value: &Field, depth: usize) {
    let indent = "  ".repeat(depth);
    match value {
        Field::Text(text) => {
            let _ = writeln!(out, "{indent}{label} {}", text.escape_debug());
        }
        Field::Integer(number) => {
            let _ = writeln!(out, "{indent}{label} {number}");
        }
        Field::Bytes(bytes) => {
            let _ = writeln!(out, "{indent}{label} 0x{}", hex::encode(bytes));
        }
        Field::List(items) => {
            let _ = writeln!(out, "{indent}{label}");
            for item in items {
                render(out, "-", item, depth + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_varsig::CanonicalPayload;
    use testresult::TestResult;

    fn grant() -> CanonicalPayload {
        CanonicalPayload::new("capability")
            .with("aud", "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK")
            .with("exp", 4600u64)
            .with("res", vec![Field::from("doc:kAbc")])
    }

    #[test]
    fn it_lists_what_is_being_granted() -> TestResult {
        let statement = String::from_utf8(signing_statement(&grant().to_bytes()?))?;

        assert!(statement.starts_with("quill wants you to sign a capability"));
        assert!(statement.contains("aud: did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK\n"));
        assert!(statement.contains("exp: 4600\n"));
        assert!(statement.contains("res:\n  - doc:kAbc\n"));
        assert!(statement.contains("\ndigest: "));
        Ok(())
    }

    #[test]
    fn different_payloads_never_share_a_statement() -> TestResult {
        let one = signing_statement(&grant().to_bytes()?);
        let two = signing_statement(&grant().with("nbf", 1u64).to_bytes()?);
        assert_ne!(one, two);
        assert_ne!(signing_statement(b"challenge"), signing_statement(b"challengf"));
        Ok(())
    }

    #[test]
    fn control_characters_cannot_forge_extra_lines() -> TestResult {
        let payload = CanonicalPayload::new("capability")
            .with("aud", "did:key:z\nexp: 99999999")
            .to_bytes()?;
        let statement = String::from_utf8(signing_statement(&payload))?;
        assert!(!statement.contains("\nexp: 99999999"));
        Ok(())
    }

    #[test]
    fn opaque_challenges_are_shown_as_hex() -> TestResult {
        let statement = String::from_utf8(signing_statement(b"hi"))?;
        assert!(statement.contains("message: 0x6869\n"));
        Ok(())
    }
}
