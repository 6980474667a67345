//! In-memory span capture keyed by analysis job.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use serde::Serialize;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Id, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

/// Span field that routes a span to its job.
pub const JOB_ID_FIELD: &str = "job_id";

/// One closed span.
#[derive(Debug, Clone, Serialize)]
pub struct SpanRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Nanoseconds since the Unix epoch.
    pub start_time: u128,
    pub end_time: u128,
    pub fields: HashMap<String, serde_json::Value>,
}

impl SpanRecord {
    pub fn duration_nanos(&self) -> u128 {
        self.end_time.saturating_sub(self.start_time)
    }
}

/// Closed spans grouped by `job_id`, in closing order.
#[derive(Debug, Default)]
pub struct JobTraceStore {
    spans: RwLock<HashMap<String, Vec<SpanRecord>>>,
}

impl JobTraceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spans_for(&self, job_id: &str) -> Vec<SpanRecord> {
        self.spans.read().unwrap_or_else(PoisonError::into_inner).get(job_id).cloned().unwrap_or_default()
    }

    pub fn job_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> =
            self.spans.read().unwrap_or_else(PoisonError::into_inner).keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Drop the spans of a finished job.
    pub fn remove(&self, job_id: &str) -> Option<Vec<SpanRecord>> {
        self.spans.write().unwrap_or_else(PoisonError::into_inner).remove(job_id)
    }

    fn push(&self, job_id: String, span: SpanRecord) {
        self.spans.write().unwrap_or_else(PoisonError::into_inner).entry(job_id).or_default().push(span);
    }
}

/// A `tracing` layer that copies every span carrying a `job_id` into a
/// [`JobTraceStore`] when it closes.
///
/// Child spans inherit `job_id` from their parent, so the spans of the
/// pipeline stages land under the job that ran them.
pub struct JobTraceLayer {
    store: Arc<JobTraceStore>,
}

impl JobTraceLayer {
    pub fn new(store: Arc<JobTraceStore>) -> Self {
        Self { store }
    }
}

#[derive(Clone)]
struct SpanFields(HashMap<String, serde_json::Value>);

struct StartTime(u128);

fn now_nanos() -> u128 {
    SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default().as_nanos()
}

impl<S> Layer<S> for JobTraceLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };

        let mut visitor = JsonVisitor::default();
        attrs.record(&mut visitor);
        let mut fields = visitor.0;

        if !fields.contains_key(JOB_ID_FIELD) {
            let inherited = span.parent().and_then(|parent| {
                parent.extensions().get::<SpanFields>().and_then(|f| f.0.get(JOB_ID_FIELD).cloned())
            });
            if let Some(job_id) = inherited {
                fields.insert(JOB_ID_FIELD.to_string(), job_id);
            }
        }

        let mut extensions = span.extensions_mut();
        extensions.insert(StartTime(now_nanos()));
        extensions.insert(SpanFields(fields));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut extensions = span.extensions_mut();
        if let Some(fields) = extensions.get_mut::<SpanFields>() {
            let mut visitor = JsonVisitor::default();
            values.record(&mut visitor);
            fields.0.extend(visitor.0);
        }
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else { return };
        let extensions = span.extensions();
        let Some(fields) = extensions.get::<SpanFields>() else { return };
        let Some(job_id) = fields.0.get(JOB_ID_FIELD).and_then(|v| v.as_str()) else { return };

        let record = SpanRecord {
            name: span.metadata().name().to_string(),
            parent: span.parent().map(|p| p.metadata().name().to_string()),
            start_time: extensions.get::<StartTime>().map_or(0, |s| s.0),
            end_time: now_nanos(),
            fields: fields.0.clone(),
        };
        self.store.push(job_id.to_string(), record);
    }
}

#[derive(Default)]
struct JsonVisitor(HashMap<String, serde_json::Value>);

impl Visit for JsonVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::Value::Bool(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }
}
