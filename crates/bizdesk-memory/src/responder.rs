//! Reply generation. Stateless: the same input always yields the same reply.

/// Produces the assistant's reply to a user message.
pub trait ResponseGenerator: Send + Sync {
    fn generate_reply(&self, department_id: &str, user_text: &str) -> String;
}

/// Deterministic keyword matcher tailored per department.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordResponder;

impl ResponseGenerator for KeywordResponder {
    fn generate_reply(&self, department_id: &str, user_text: &str) -> String {
        let lower = user_text.to_lowercase();
        let has = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

        let reply = match department_id {
            "hr" if has(&["pto", "vacation"]) => {
                "HR: Our PTO policy grants 15 days annually. You can request via the HR portal. Would you like a link?"
            }
            "hr" => "HR assistant: I can help with onboarding, benefits, and policy questions.",
            "it" if has(&["vpn"]) => {
                "IT: To access VPN, install the VPN client and use your SSO credentials."
            }
            "it" => "IT assistant: I can help with access requests, devices, and troubleshooting.",
            "finance" if has(&["expense"]) => {
                "Finance: Submit expenses within 30 days. Attach receipts for items over $25."
            }
            "finance" => "Finance assistant: I can help with expenses, invoices, and approvals.",
            "sales" if has(&["proposal"]) => {
                "Sales: For proposals, share the client name and scope; I can draft an outline."
            }
            "sales" => "Sales assistant: I can help with leads, CRM updates, and proposals.",
            "ops" if has(&["incident"]) => {
                "Ops: Follow SEV runbook. Notify on-call, gather logs, and post updates."
            }
            "ops" => "Ops assistant: I can help with runbooks, checklists, and escalations.",
            _ => "Assistant ready.",
        };
        reply.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pto_policy() {
        let reply = KeywordResponder.generate_reply("hr", "What is the PTO policy?");
        assert!(reply.contains("15 days annually"));
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert!(KeywordResponder.generate_reply("it", "My VPN is down").contains("VPN client"));
        assert!(KeywordResponder.generate_reply("ops", "INCIDENT in prod").contains("SEV runbook"));
        assert!(KeywordResponder.generate_reply("finance", "expense limits").contains("30 days"));
        assert!(KeywordResponder.generate_reply("sales", "need a Proposal").contains("outline"));
    }

    #[test]
    fn test_fallbacks() {
        assert!(KeywordResponder.generate_reply("hr", "hello").starts_with("HR assistant"));
        assert_eq!(KeywordResponder.generate_reply("legal", "pto"), "Assistant ready.");
    }
}
