//! Normalization of backend account shapes into [`LinkedBank`].

use crate::types::{LinkedBank, RawAccount};

/// Map one raw account to a linked bank, or `None` if it cannot be used.
pub fn reconcile(raw: &RawAccount, session_id: &str) -> Option<LinkedBank> {
    match raw {
        RawAccount::LinkedAccount {
            display_name,
            institution_name,
            last4,
            ..
        } => Some(LinkedBank {
            session_id: session_id.to_string(),
            display_name: display_name.clone(),
            bank_name: Some(institution_name.clone()),
            last4: last4.clone(),
            instantly_verified: true,
        }),
        RawAccount::BankAccount {
            bank_name, last4, ..
        } => Some(LinkedBank {
            session_id: session_id.to_string(),
            display_name: bank_name.clone(),
            bank_name: bank_name.clone(),
            last4: Some(last4.clone()),
            instantly_verified: false,
        }),
        RawAccount::Unparsable { .. } => None,
    }
}

/// Reconcile a sequence, dropping unusable accounts and keeping order.
pub fn reconcile_all(raws: &[RawAccount], session_id: &str) -> Vec<LinkedBank> {
    raws.iter()
        .filter_map(|raw| reconcile(raw, session_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linked_account_is_instantly_verified() {
        let raw = RawAccount::LinkedAccount {
            id: Some("fca_1".to_string()),
            display_name: Some("Everyday Checking".to_string()),
            institution_name: "Chase".to_string(),
            last4: Some("6789".to_string()),
        };

        let bank = reconcile(&raw, "las_1").unwrap();
        assert_eq!(
            bank,
            LinkedBank {
                session_id: "las_1".to_string(),
                display_name: Some("Everyday Checking".to_string()),
                bank_name: Some("Chase".to_string()),
                last4: Some("6789".to_string()),
                instantly_verified: true,
            }
        );
    }

    #[test]
    fn test_bank_account_uses_bank_name_as_display_name() {
        let raw = RawAccount::BankAccount {
            id: None,
            bank_name: Some("Chase".to_string()),
            last4: "4242".to_string(),
        };

        let bank = reconcile(&raw, "las_1").unwrap();
        assert_eq!(bank.display_name.as_deref(), Some("Chase"));
        assert_eq!(bank.bank_name.as_deref(), Some("Chase"));
        assert_eq!(bank.last4.as_deref(), Some("4242"));
        assert!(!bank.instantly_verified);
    }

    #[test]
    fn test_unparsable_maps_to_none() {
        let raw = RawAccount::Unparsable {
            id: Some("x".to_string()),
        };
        assert!(reconcile(&raw, "las_1").is_none());
    }

    #[test]
    fn test_reconcile_all_keeps_fetch_order() {
        let raws = vec![
            RawAccount::Unparsable { id: None },
            RawAccount::BankAccount {
                id: None,
                bank_name: Some("First".to_string()),
                last4: "0001".to_string(),
            },
            RawAccount::LinkedAccount {
                id: None,
                display_name: None,
                institution_name: "Second".to_string(),
                last4: None,
            },
        ];

        let banks = reconcile_all(&raws, "las_1");
        assert_eq!(banks.len(), 2);
        assert_eq!(banks[0].bank_name.as_deref(), Some("First"));
        assert_eq!(banks[1].bank_name.as_deref(), Some("Second"));
    }
}
