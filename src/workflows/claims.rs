use std::collections::HashSet;
use std::sync::Mutex;

/// Short-lived per-suggestion locks so one process never promotes the same id twice at once.
#[derive(Debug, Default)]
pub struct PromotionClaims {
    held: Mutex<HashSet<String>>,
}

impl PromotionClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` while another promotion of the same id is running.
    pub fn try_claim(&self, suggestion_id: &str) -> Option<ClaimGuard<'_>> {
        let mut held = self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !held.insert(suggestion_id.to_string()) {
            return None;
        }
        Some(ClaimGuard {
            claims: self,
            suggestion_id: suggestion_id.to_string(),
        })
    }

    #[cfg(test)]
    pub fn is_claimed(&self, suggestion_id: &str) -> bool {
        self.held
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(suggestion_id)
    }
}

/// Releases the claim when dropped, whether the promotion succeeded or not.
#[derive(Debug)]
pub struct ClaimGuard<'a> {
    claims: &'a PromotionClaims,
    suggestion_id: String,
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        let mut held = self
            .claims
            .held
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        held.remove(&self.suggestion_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_waits_for_release() {
        let claims = PromotionClaims::new();
        let first = claims.try_claim("s-1").expect("first claim");
        assert!(claims.try_claim("s-1").is_none());
        assert!(claims.try_claim("s-2").is_some());
        assert!(claims.is_claimed("s-1"));

        drop(first);
        assert!(!claims.is_claimed("s-1"));
        assert!(claims.try_claim("s-1").is_some());
    }
}
