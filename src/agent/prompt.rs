//! Analyst directive and task text.

use chrono::NaiveDate;

/// Display name of the reasoning agent
pub const ANALYST_NAME: &str = "Market_Analyst";

/// Display name of the tool-executing agent
pub const PROXY_NAME: &str = "User_Proxy";

/// System directive for the analyst
pub fn analyst_directive(terminal_marker: &str) -> String {
    format!(
        "You are a Market Analyst with strong analytical and problem-solving skills. \
         Collect the financial information you need and aggregate it according to the \
         client's request. Only use the functions you have been provided with. \
         Reply {} when the task is done.",
        terminal_marker
    )
}

/// Opening request for one subject on one date
pub fn task_prompt(subject: &str, date: NaiveDate, language: &str) -> String {
    format!(
        "Report in {language}. Use all the tools provided to retrieve information available \
         for {subject} upon {date}. Analyze the positive developments and potential concerns \
         of {subject} with 2-4 most important factors respectively and keep them concise. \
         Most factors should be inferred from company related news. Then make a rough \
         prediction (e.g. up/down by %) of the {subject} stock price movement for next week. \
         Provide a summary analysis to support your prediction. Write the report in markdown \
         with a level-three heading for each section.",
        language = language,
        subject = subject,
        date = date.format("%Y-%m-%d"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_prompt_mentions_subject_and_date() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let prompt = task_prompt("ACME", date, "English");
        assert!(prompt.contains("for ACME upon 2024-05-01"));
        // The report marker must not match the task itself
        assert!(!prompt.contains("###"));
    }

    #[test]
    fn test_directive_names_marker() {
        assert!(analyst_directive("TERMINATE").ends_with("Reply TERMINATE when the task is done."));
    }
}
