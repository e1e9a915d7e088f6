use crate::config::Config;
use crate::db::codes::RedemptionCode;
use crate::db::{codes, profiles, Database, StoreError};

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemOutcome {
    pub success: bool,
    pub message: &'static str,
}

impl RedeemOutcome {
    fn ok(message: &'static str) -> Self {
        Self {
            success: true,
            message,
        }
    }

    fn rejected(message: &'static str) -> Self {
        Self {
            success: false,
            message,
        }
    }
}

/// Codes are matched case-insensitively; blank input is no code at all.
pub(crate) fn normalize_code(input: &str) -> Option<String> {
    let code = input.trim().to_uppercase();
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

pub(crate) fn matches_master(master: Option<&str>, code: &str) -> bool {
    master.is_some_and(|m| m == code)
}

/// Decides what a stored-code lookup means. A used code is a rejection: the
/// caller never reaches the upgrade path off this branch.
pub(crate) fn decide_stored(stored: Option<&RedemptionCode>) -> Result<String, &'static str> {
    match stored {
        None => Err("Invalid or unknown code."),
        Some(code) if code.is_used => Err("This code has already been used."),
        Some(code) => Ok(code.id.clone()),
    }
}

/// Redeems a premium access code. The master code always works; other codes
/// are single-use rows. Mark-used and upgrade run sequentially, not in a
/// transaction: a crash between the two burns the code without upgrading,
/// which matches the store-last-wins posture of the rest of the service.
pub async fn redeem_code(
    db: &Database,
    config: &Config,
    user_id: &str,
    input_code: &str,
) -> Result<RedeemOutcome, StoreError> {
    let Some(code) = normalize_code(input_code) else {
        return Ok(RedeemOutcome::rejected("No code provided."));
    };

    if matches_master(config.premium_master_code.as_deref(), &code) {
        profiles::set_premium(db, user_id).await?;
        return Ok(RedeemOutcome::ok("ALPHA PRO access unlocked."));
    }

    let stored = codes::find_code(db, &code).await?;
    let code_id = match decide_stored(stored.as_ref()) {
        Ok(code_id) => code_id,
        Err(message) => return Ok(RedeemOutcome::rejected(message)),
    };

    codes::mark_code_used(db, &code_id, user_id).await?;
    profiles::set_premium(db, user_id).await?;

    Ok(RedeemOutcome::ok("Code redeemed successfully."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(is_used: bool) -> RedemptionCode {
        RedemptionCode {
            id: "code-row-1".to_string(),
            code: "ALPHA1".to_string(),
            is_used,
        }
    }

    #[test]
    fn test_normalize_uppercases_and_rejects_blank() {
        assert_eq!(normalize_code(" c7yp81 ").as_deref(), Some("C7YP81"));
        assert_eq!(normalize_code(""), None);
        assert_eq!(normalize_code("   "), None);
    }

    #[test]
    fn test_master_code_matches_case_insensitively() {
        assert!(matches_master(
            Some("C7YP81"),
            &normalize_code("c7yp81").unwrap()
        ));
        assert!(!matches_master(Some("C7YP81"), "OTHER1"));
        assert!(!matches_master(None, "C7YP81"));
    }

    #[test]
    fn test_unknown_code_is_rejected() {
        assert!(decide_stored(None).is_err());
    }

    #[test]
    fn test_used_code_is_rejected_not_redeemed() {
        let code = stored(true);
        assert_eq!(
            decide_stored(Some(&code)),
            Err("This code has already been used.")
        );
    }

    #[test]
    fn test_fresh_code_redeems_by_row_id() {
        let code = stored(false);
        assert_eq!(decide_stored(Some(&code)), Ok("code-row-1".to_string()));
    }
}
