//! Department Registry: the catalog of departments and their tools.
//!
//! Seeded once at startup and shared read-only afterwards. Registration is
//! keyed by department id, so seeding twice never duplicates entries.

use crate::error::{BizDeskError, Result};
use crate::types::{DepartmentDefinition, FieldType, FormField, SubmitBehavior, TaskStatus, ToolDefinition};

/// Ordered registry of departments.
#[derive(Debug, Clone, Default)]
pub struct DepartmentRegistry {
    departments: Vec<DepartmentDefinition>,
}

impl DepartmentRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create registry with the 5 built-in departments.
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        reg.seed_defaults();
        reg
    }

    /// Register the built-in departments. Returns how many were newly added.
    pub fn seed_defaults(&mut self) -> usize {
        builtin_departments()
            .into_iter()
            .filter(|dept| self.register(dept.clone()))
            .count()
    }

    /// Register a department. Returns `false` if the id is already taken.
    pub fn register(&mut self, department: DepartmentDefinition) -> bool {
        if self.departments.iter().any(|d| d.id == department.id) {
            tracing::debug!("Department '{}' already registered, skipping", department.id);
            return false;
        }
        tracing::info!(
            "🏢 Registered department: {} ({} tools)",
            department.name,
            department.tools.len()
        );
        self.departments.push(department);
        true
    }

    /// All departments in registration order.
    pub fn list(&self) -> &[DepartmentDefinition] {
        &self.departments
    }

    pub fn find_department(&self, id: &str) -> Option<&DepartmentDefinition> {
        self.departments.iter().find(|d| d.id == id)
    }

    pub fn find_tool(&self, department_id: &str, tool_id: &str) -> Option<&ToolDefinition> {
        self.find_department(department_id)?.find_tool(tool_id)
    }

    /// Like [`find_department`](Self::find_department) but as a `NotFound` error.
    pub fn require_department(&self, id: &str) -> Result<&DepartmentDefinition> {
        self.find_department(id)
            .ok_or_else(|| BizDeskError::not_found("department not found"))
    }

    /// Resolve a tool, distinguishing an unknown department from an unknown tool.
    pub fn require_tool(
        &self,
        department_id: &str,
        tool_id: &str,
    ) -> Result<(&DepartmentDefinition, &ToolDefinition)> {
        let department = self.require_department(department_id)?;
        let tool = department
            .find_tool(tool_id)
            .ok_or_else(|| BizDeskError::not_found("tool not found"))?;
        Ok((department, tool))
    }

    pub fn count(&self) -> usize {
        self.departments.len()
    }
}

fn tool(id: &str, name: &str, description: &str, behavior: SubmitBehavior) -> ToolDefinition {
    ToolDefinition {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        on_submit_behavior: behavior,
        default_task_status: None,
        supports_recurrence: false,
        form: None,
    }
}

/// Built-in departments.
fn builtin_departments() -> Vec<DepartmentDefinition> {
    use FieldType::*;
    use SubmitBehavior::*;

    vec![
        DepartmentDefinition {
            id: "hr".into(),
            name: "Human Resources".into(),
            description: "Onboarding, benefits, time off, and policy questions.".into(),
            tools: vec![
                ToolDefinition {
                    form: Some(vec![
                        FormField::new("employee", "Employee", Text).required(),
                        FormField::new("startDate", "Start date", Text).placeholder("YYYY-MM-DD").required(),
                        FormField::new("endDate", "End date", Text).placeholder("YYYY-MM-DD").required(),
                        FormField::new("reason", "Reason", Textarea),
                    ]),
                    ..tool("pto-request", "PTO Request", "Request paid time off for approval.", CreateTask)
                },
                ToolDefinition {
                    default_task_status: Some(TaskStatus::InProgress),
                    form: Some(vec![
                        FormField::new("name", "New hire name", Text).required(),
                        FormField::new("email", "Work email", Email).required(),
                        FormField::new("startDate", "Start date", Text).placeholder("YYYY-MM-DD"),
                    ]),
                    ..tool("onboarding", "Onboarding Kickoff", "Start the onboarding checklist for a new hire.", CreateTask)
                },
                tool("policy-lookup", "Policy Lookup", "Ask the assistant about company policies in chat.", ChatHint),
            ],
        },
        DepartmentDefinition {
            id: "it".into(),
            name: "IT".into(),
            description: "Access requests, devices, and troubleshooting.".into(),
            tools: vec![
                ToolDefinition {
                    form: Some(vec![
                        FormField::new("system", "System", Select)
                            .required()
                            .options(&[("github", "GitHub"), ("aws", "AWS"), ("crm", "CRM")]),
                        FormField::new("justification", "Justification", Textarea).required(),
                    ]),
                    ..tool("access-request", "Access Request", "Request access to an internal system.", CreateTask)
                },
                ToolDefinition {
                    form: Some(vec![FormField::new("email", "Account email", Email).required()]),
                    ..tool("password-reset", "Password Reset", "Send a password reset link immediately.", ImmediateAction)
                },
                tool("vpn-help", "VPN Help", "Troubleshoot VPN connectivity with the assistant.", ChatHint),
            ],
        },
        DepartmentDefinition {
            id: "finance".into(),
            name: "Finance".into(),
            description: "Expenses, invoices, and approvals.".into(),
            tools: vec![
                ToolDefinition {
                    default_task_status: Some(TaskStatus::NeedsReview),
                    form: Some(vec![
                        FormField::new("amount", "Amount", Number).required(),
                        FormField::new("category", "Category", Select).options(&[
                            ("travel", "Travel"),
                            ("meals", "Meals"),
                            ("software", "Software"),
                        ]),
                        FormField::new("notes", "Notes", Textarea),
                    ]),
                    ..tool("expense-report", "Expense Report", "Submit an expense for review.", CreateTask)
                },
                tool("invoice-status", "Invoice Status", "Ask about the status of an invoice in chat.", ChatHint),
            ],
        },
        DepartmentDefinition {
            id: "sales".into(),
            name: "Sales".into(),
            description: "Leads, CRM updates, and proposals.".into(),
            tools: vec![
                ToolDefinition {
                    form: Some(vec![
                        FormField::new("company", "Company", Text).required(),
                        FormField::new("contact", "Contact email", Email),
                    ]),
                    ..tool("log-lead", "Log Lead", "Record a new lead in the CRM.", ImmediateAction)
                },
                ToolDefinition {
                    form: Some(vec![
                        FormField::new("client", "Client", Text).required(),
                        FormField::new("scope", "Scope", Textarea),
                    ]),
                    ..tool("proposal-draft", "Proposal Draft", "Queue a proposal outline for drafting.", CreateTask)
                },
            ],
        },
        DepartmentDefinition {
            id: "ops".into(),
            name: "Operations".into(),
            description: "Runbooks, checklists, and escalations.".into(),
            tools: vec![
                ToolDefinition {
                    supports_recurrence: true,
                    form: Some(vec![
                        FormField::new("checklist", "Checklist", Textarea).required(),
                        FormField::new("interval", "Interval (minutes)", Number).placeholder("60"),
                    ]),
                    ..tool("daily-checklist", "Daily Checklist", "Recurring operational checklist.", CreateTask)
                },
                ToolDefinition {
                    default_task_status: Some(TaskStatus::AttentionRequired),
                    form: Some(vec![
                        FormField::new("summary", "Summary", Text).required(),
                        FormField::new("severity", "Severity", Select)
                            .required()
                            .options(&[("sev1", "SEV1"), ("sev2", "SEV2"), ("sev3", "SEV3")]),
                    ]),
                    ..tool("incident-report", "Incident Report", "Open an incident for the on-call engineer.", CreateTask)
                },
                tool("runbook-search", "Runbook Search", "Find the right runbook through chat.", ChatHint),
            ],
        },
    ]
}
