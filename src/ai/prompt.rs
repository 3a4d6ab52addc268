//! Prompt text for the SQL chain.

/// Completion for the SQL query stops before the model invents a result
pub const SQL_RESULT_STOP: &str = "\nSQLResult:";

/// Prompt asking for a SQLite query that answers `input`
#[must_use]
pub fn sqlite_prompt(table_info: &str, top_k: usize, input: &str) -> String {
    format!(
        "You are a SQLite expert. Given an input question, first write a syntactically correct \
SQLite query to run, then look at the results of the query and return the answer to the input question.
Unless the question asks for a specific number of examples, query for at most {top_k} results \
using the LIMIT clause. You may order the results to return the most informative data in the database.
Never query for all columns of a table; select only the columns needed to answer the question. \
Wrap each column name in double quotes (\") to mark it as a delimited identifier.
Use only the column names shown in the tables below and do not query columns that do not exist. \
Pay attention to which column belongs to which table.
Use the date('now') function to get the current date if the question involves \"today\".

Use the following format:

Question: Question here
SQLQuery: SQL Query to run
SQLResult: Result of the SQLQuery
Answer: Final answer here

Only use the following tables:
{table_info}

Question: {input}"
    )
}

/// Prompt asking the model to review a generated query
#[must_use]
pub fn query_checker_prompt(query: &str) -> String {
    format!(
        "{query}
Double check the SQLite query above for common mistakes, including:
- Using NOT IN with NULL values
- Using UNION when UNION ALL should have been used
- Using BETWEEN for exclusive ranges
- Data type mismatch in predicates
- Properly quoting identifiers
- Using the correct number of arguments for functions
- Casting to the correct data type
- Using the proper columns for joins

If there are any of the above mistakes, rewrite the query. If there are no mistakes, \
just reproduce the original query.

Output the final SQL query only.

SQL Query: "
    )
}

/// The running input: question, then the query and its result once known
#[must_use]
pub fn chain_input(question: &str) -> String {
    format!("{question}\nSQLQuery:")
}

/// Extend the running input with the executed query and its result, asking
/// for the final answer
#[must_use]
pub fn answer_input(input: &str, sql: &str, result: &str) -> String {
    format!("{input} {sql}\nSQLResult: {result}\nAnswer:")
}
