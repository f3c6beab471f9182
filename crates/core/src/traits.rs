//! External collaborator interfaces.
//!
//! The metric store and the expression parser/evaluator live outside this
//! engine (see spec §1/§6). They're modeled here as capability traits so
//! tests can substitute in-memory fakes instead of pulling in a real chart
//! database or expression compiler.

/// Result of a single metric-store query.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryResult {
    pub value: f64,
    pub db_after: i64,
    pub db_before: i64,
    pub value_is_null: bool,
}

/// Chart-level state a rule's runnability gate needs to see.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartFlags {
    pub obsolete: bool,
    pub enabled: bool,
    pub collected_samples: u64,
    /// Unix timestamp of the chart's last collection, 0 if never collected.
    pub last_collected_sec: i64,
}

/// The metric chart/dimension database, consumed read-only by the evaluation
/// loop. A non-success query sets `DbError` on the calling rule.
pub trait MetricQuery: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn query(
        &self,
        chart: &str,
        dims: &str,
        points: u32,
        after: i64,
        before: i64,
        group: &str,
        options: &str,
    ) -> Result<QueryResult, String>;

    fn first_time(&self, chart: &str) -> i64;
    fn last_time(&self, chart: &str) -> i64;
    fn flags(&self, chart: &str) -> ChartFlags;
}

/// A compiled expression, as handed back by the (external) expression
/// parser. `evaluate` recomputes `result`; failures are reported via
/// `error_msg` rather than via the Rust `Err` payload carrying useful state,
/// mirroring the capability described in spec §6.
pub trait Expression: Send + Sync {
    fn evaluate(&mut self) -> Result<(), String>;
    fn result(&self) -> f64;
    fn error_msg(&self) -> &str;
    fn parsed_as(&self) -> &str;
    fn source(&self) -> &str;
}
