//! Natural-language to SQL chain.
//!
//! Describes the schema to the model, asks it for a query, optionally has
//! it review that query, runs it against the store and asks for a prose
//! answer grounded in the result.

use crate::ai::prompt::{
    SQL_RESULT_STOP, answer_input, chain_input, query_checker_prompt, sqlite_prompt,
};
use crate::config::ChainConfig;
use crate::error::{Error, Result};
use crate::llm::LanguageModel;
use crate::store::{Store, tuple_text};
use crate::view::StatementKind;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, info};

static FENCED_SQL: OnceLock<Regex> = OnceLock::new();

fn fenced_sql() -> &'static Regex {
    FENCED_SQL.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)```").expect("fenced SQL pattern is valid")
    })
}

/// One recorded stage of a chain run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainStep {
    GeneratedSql(String),
    CheckedSql(String),
    SqlResult(String),
    Answer(String),
}

/// Everything a chain run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutput {
    pub question: String,
    /// The query that was executed
    pub sql: String,
    /// Rows of the executed query as tuple text; empty when none
    pub sql_result: String,
    /// Prose answer, or the SQL result itself when returning directly
    pub answer: String,
    pub steps: Vec<ChainStep>,
}

impl fmt::Display for ChainOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Question: {}", self.question)?;
        writeln!(f, "SQLQuery: {}", self.sql)?;
        writeln!(f, "SQLResult: {}", self.sql_result)?;
        write!(f, "Answer: {}", self.answer)
    }
}

/// SQL chain over one database and one language model
pub struct SqlChain<M> {
    model: M,
    store: Store,
    config: ChainConfig,
}

impl<M: LanguageModel + Sync> SqlChain<M> {
    pub fn new(model: M, store: Store, config: ChainConfig) -> Self {
        Self {
            model,
            store,
            config,
        }
    }

    /// Answer a question end to end
    pub async fn run(&self, question: &str) -> Result<ChainOutput> {
        let mut steps = Vec::new();

        let table_info = self.store.table_info(self.config.sample_rows_in_table_info)?;
        let input = chain_input(question);
        let prompt = sqlite_prompt(&table_info, self.config.top_k, &input);

        let generated = self.model.complete(&prompt, &[SQL_RESULT_STOP]).await?;
        let mut sql = clean_sql(&generated)?;
        debug!("Generated SQL: {sql}");
        steps.push(ChainStep::GeneratedSql(sql.clone()));

        if self.config.use_query_checker {
            let checked = self.model.complete(&query_checker_prompt(&sql), &[]).await?;
            sql = clean_sql(&checked)?;
            debug!("Checked SQL: {sql}");
            steps.push(ChainStep::CheckedSql(sql.clone()));
        }

        info!("Running generated SQL: {sql}");
        let sql_result = self.execute(&sql)?;
        steps.push(ChainStep::SqlResult(sql_result.clone()));

        let answer = if self.config.return_direct {
            sql_result.clone()
        } else {
            let prompt = sqlite_prompt(
                &table_info,
                self.config.top_k,
                &answer_input(&input, &sql, &sql_result),
            );
            self.model.complete(&prompt, &[]).await?.trim().to_string()
        };
        steps.push(ChainStep::Answer(answer.clone()));

        Ok(ChainOutput {
            question: question.to_string(),
            sql,
            sql_result,
            answer,
            steps,
        })
    }

    /// Run the generated statement. Mutations are committed and report no
    /// rows; reads return their rows as tuple text.
    fn execute(&self, sql: &str) -> Result<String> {
        if StatementKind::classify(sql).is_mutating() {
            self.store.execute(sql)?;
            return Ok(String::new());
        }
        let (_, rows) = self.store.fetch_raw(sql)?;
        if rows.is_empty() {
            Ok(String::new())
        } else {
            Ok(tuple_text(&rows))
        }
    }
}

/// Pull the SQL statement out of a completion: code fences, a leading
/// `SQLQuery:` label and anything from `SQLResult:` on are removed
pub fn clean_sql(completion: &str) -> Result<String> {
    let mut text = match fenced_sql().captures(completion) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => completion,
    }
    .trim();

    if let Some(pos) = text.find("SQLResult:") {
        text = text[..pos].trim();
    }
    if let Some(rest) = text
        .get(..9)
        .filter(|label| label.eq_ignore_ascii_case("SQLQuery:"))
        .and_then(|_| text.get(9..))
    {
        text = rest.trim();
    }

    if text.is_empty() {
        return Err(Error::Chain("model returned no SQL".to_string()));
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, LlmResult};
    use std::future::Future;
    use std::sync::Mutex;

    /// Replays canned completions and records the prompts it was given
    struct ScriptedModel {
        replies: Mutex<Vec<LlmResult<String>>>,
        prompts: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<LlmResult<String>>) -> Self {
            let mut replies = replies;
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<(String, Vec<String>)> {
            self.prompts.lock().unwrap().clone()
        }
    }

    impl LanguageModel for ScriptedModel {
        fn complete(
            &self,
            prompt: &str,
            stop: &[&str],
        ) -> impl Future<Output = LlmResult<String>> + Send {
            self.prompts.lock().unwrap().push((
                prompt.to_string(),
                stop.iter().map(|s| (*s).to_string()).collect(),
            ));
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(LlmError::EmptyResponse));
            async move { reply }
        }
    }

    fn store_with_users() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("chain.db"));
        store.ensure_exists().unwrap();
        store
            .execute(
                "CREATE TABLE users (name TEXT, age INTEGER, city TEXT);
                 INSERT INTO users VALUES ('Ann', 81, 'Lisbon'), ('Bo', 34, 'Oslo');",
            )
            .unwrap();
        (dir, store)
    }

    #[test]
    fn test_clean_sql() {
        assert_eq!(clean_sql(" SELECT 1 ").unwrap(), "SELECT 1");
        assert_eq!(clean_sql("```sql\nSELECT 1;\n```").unwrap(), "SELECT 1;");
        assert_eq!(clean_sql("SQLQuery: SELECT 2").unwrap(), "SELECT 2");
        assert_eq!(
            clean_sql("SELECT 3\nSQLResult: [(3,)]\nAnswer: three").unwrap(),
            "SELECT 3"
        );
        assert!(matches!(clean_sql("   "), Err(Error::Chain(_))));
    }

    #[tokio::test]
    async fn test_run_with_checker_and_answer() {
        let (_dir, store) = store_with_users();
        let model = ScriptedModel::new(vec![
            Ok(" SELECT \"city\" FROM users ORDER BY \"age\" DESC LIMIT 1".to_string()),
            Ok("```sql\nSELECT \"city\" FROM users ORDER BY \"age\" DESC LIMIT 1\n```".to_string()),
            Ok(" The oldest user is from Lisbon.".to_string()),
        ]);
        let chain = SqlChain::new(model, store, ChainConfig::default());

        let output = chain.run("what city is the oldest user from").await.unwrap();
        assert_eq!(output.sql, "SELECT \"city\" FROM users ORDER BY \"age\" DESC LIMIT 1");
        assert_eq!(output.sql_result, "[('Lisbon',)]");
        assert_eq!(output.answer, "The oldest user is from Lisbon.");
        assert_eq!(output.steps.len(), 4);

        let prompts = chain.model.prompts();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].0.contains("CREATE TABLE users"));
        assert_eq!(prompts[0].1, vec![SQL_RESULT_STOP.to_string()]);
        assert!(prompts[1].0.contains("Double check the SQLite query"));
        assert!(prompts[2].0.ends_with("SQLResult: [('Lisbon',)]\nAnswer:"));
    }

    #[tokio::test]
    async fn test_return_direct_skips_answer_call() {
        let (_dir, store) = store_with_users();
        let model = ScriptedModel::new(vec![Ok("SELECT COUNT(*) FROM users".to_string())]);
        let config = ChainConfig {
            use_query_checker: false,
            return_direct: true,
            ..ChainConfig::default()
        };
        let chain = SqlChain::new(model, store, config);

        let output = chain.run("how many users").await.unwrap();
        assert_eq!(output.answer, "[(2,)]");
        assert_eq!(chain.model.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_sql_is_an_error() {
        let (_dir, store) = store_with_users();
        let model = ScriptedModel::new(vec![Ok("SELECT nope FROM missing".to_string())]);
        let config = ChainConfig {
            use_query_checker: false,
            ..ChainConfig::default()
        };
        let chain = SqlChain::new(model, store, config);

        match chain.run("anything").await {
            Err(Error::Database(_)) => {}
            other => panic!("Expected Database error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let (_dir, store) = store_with_users();
        let model = ScriptedModel::new(vec![Err(LlmError::AuthError("invalid x-api-key".to_string()))]);
        let chain = SqlChain::new(model, store, ChainConfig::default());

        match chain.run("anything").await {
            Err(Error::Llm(LlmError::AuthError(_))) => {}
            other => panic!("Expected auth error, got {other:?}"),
        }
    }

    #[test]
    fn test_output_display() {
        let output = ChainOutput {
            question: "q".to_string(),
            sql: "SELECT 1".to_string(),
            sql_result: "[(1,)]".to_string(),
            answer: "one".to_string(),
            steps: Vec::new(),
        };
        assert_eq!(
            output.to_string(),
            "Question: q\nSQLQuery: SELECT 1\nSQLResult: [(1,)]\nAnswer: one"
        );
    }
}
