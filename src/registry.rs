//! Metric families backed by `metrics-exporter-prometheus` recorders.
//!
//! A [`Registry`] is an explicit handle passed to whoever needs to register
//! instruments; nothing here installs a global recorder. Counter families
//! share one recorder. Each histogram family gets its own recorder so that it
//! can carry its own bucket ladder: `PrometheusBuilder::set_buckets_for_metric`
//! only applies before the recorder is built, while families are registered
//! at runtime, whenever a middleware is constructed.

use metrics::{Counter, Histogram, Key, KeyName, Label, Level, Metadata, Recorder};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{MetricsError, Result};

/// Name and labels of a metric family.
#[derive(Debug, Clone)]
pub struct Opts {
    pub namespace: String,
    pub subsystem: String,
    pub name: String,
    pub help: String,
    pub label_names: Vec<&'static str>,
}

impl Opts {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            namespace: String::new(),
            subsystem: String::new(),
            name: name.into(),
            help: help.into(),
            label_names: Vec::new(),
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = subsystem.into();
        self
    }

    pub fn label_names(mut self, label_names: &[&'static str]) -> Self {
        self.label_names = label_names.to_vec();
        self
    }

    /// `namespace_subsystem_name`, skipping empty parts.
    pub fn fq_name(&self) -> String {
        [&self.namespace, &self.subsystem, &self.name]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("_")
    }
}

#[derive(Debug, Clone)]
pub struct HistogramOpts {
    pub common: Opts,
    pub buckets: Vec<f64>,
}

impl HistogramOpts {
    pub fn new(common: Opts, buckets: Vec<f64>) -> Self {
        Self { common, buckets }
    }
}

#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

struct Inner {
    counters: Arc<PrometheusRecorder>,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    names: BTreeSet<String>,
    histograms: Vec<(String, PrometheusHandle)>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                counters: Arc::new(PrometheusBuilder::new().build_recorder()),
                state: Mutex::new(State::default()),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn already_registered(name: String) -> MetricsError {
        warn!(metric = %name, "duplicate metric registration");
        MetricsError::AlreadyRegistered(name)
    }

    pub fn register_counter(&self, opts: Opts) -> Result<CounterVec> {
        let name = opts.fq_name();
        if !self.state().names.insert(name.clone()) {
            return Err(Self::already_registered(name));
        }

        let recorder = self.inner.counters.clone();
        recorder.describe_counter(KeyName::from(name.clone()), None, opts.help.into());
        debug!(metric = %name, labels = ?opts.label_names, "registered counter");

        Ok(CounterVec {
            family: Family::new(name, opts.label_names, recorder),
        })
    }

    /// Registers a histogram family with its own bucket ladder.
    ///
    /// The exporter rejects an empty ladder; the name is only claimed once the
    /// recorder has been built.
    pub fn register_histogram(&self, opts: HistogramOpts) -> Result<HistogramVec> {
        let HistogramOpts { common, buckets } = opts;
        let name = common.fq_name();

        let mut state = self.state();
        if state.names.contains(&name) {
            return Err(Self::already_registered(name));
        }

        let recorder = Arc::new(PrometheusBuilder::new().set_buckets(&buckets)?.build_recorder());
        state.names.insert(name.clone());
        state.histograms.push((name.clone(), recorder.handle()));
        drop(state);

        recorder.describe_histogram(KeyName::from(name.clone()), None, common.help.into());
        debug!(metric = %name, labels = ?common.label_names, ?buckets, "registered histogram");

        Ok(HistogramVec {
            family: Family::new(name, common.label_names, recorder),
        })
    }

    /// Releases a family name so it can be registered again.
    ///
    /// Handles already given out keep working, but a histogram family stops
    /// being rendered.
    pub fn unregister(&self, name: &str) -> bool {
        let mut state = self.state();
        state.histograms.retain(|(family, _)| family != name);
        let removed = state.names.remove(name);
        if removed {
            debug!(metric = %name, "unregistered metric family");
        }
        removed
    }

    /// Sorted fully qualified names of every registered family.
    pub fn names(&self) -> Vec<String> {
        self.state().names.iter().cloned().collect()
    }

    /// Prometheus text exposition of every registered family.
    pub fn render(&self) -> String {
        let mut out = self.inner.counters.handle().render();
        for (_, handle) in &self.state().histograms {
            out.push_str(&handle.render());
        }
        out
    }
}

#[derive(Clone)]
struct Family {
    name: KeyName,
    label_names: Arc<[&'static str]>,
    recorder: Arc<PrometheusRecorder>,
}

impl Family {
    fn new(name: String, label_names: Vec<&'static str>, recorder: Arc<PrometheusRecorder>) -> Self {
        Self {
            name: KeyName::from(name),
            label_names: label_names.into(),
            recorder,
        }
    }

    fn key(&self, values: &[&str]) -> Key {
        debug_assert_eq!(
            values.len(),
            self.label_names.len(),
            "label values do not match label names of {}",
            self.name.as_str()
        );

        let labels: Vec<Label> = self
            .label_names
            .iter()
            .zip(values)
            .map(|(name, value)| Label::new(*name, value.to_string()))
            .collect();

        Key::from_parts(self.name.clone(), labels)
    }
}

fn metadata() -> Metadata<'static> {
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()))
}

/// Counter family; values are positional in label-name order.
#[derive(Clone)]
pub struct CounterVec {
    family: Family,
}

impl CounterVec {
    pub fn with_label_values(&self, values: &[&str]) -> Counter {
        let key = self.family.key(values);
        self.family.recorder.register_counter(&key, &metadata())
    }
}

/// Histogram family; values are positional in label-name order.
#[derive(Clone)]
pub struct HistogramVec {
    family: Family,
}

impl HistogramVec {
    /// Fully qualified family name.
    pub fn name(&self) -> &str {
        self.family.name.as_str()
    }

    pub fn with_label_values(&self, values: &[&str]) -> Histogram {
        let key = self.family.key(values);
        self.family.recorder.register_histogram(&key, &metadata())
    }

    pub fn start_timer(&self, values: &[&str]) -> HistogramTimer {
        HistogramTimer {
            histogram: self.with_label_values(values),
            start: Instant::now(),
        }
    }
}

/// Records the time since it was started into one histogram series.
///
/// Dropping the timer without calling [`HistogramTimer::observe_duration`]
/// records nothing.
pub struct HistogramTimer {
    histogram: Histogram,
    start: Instant,
}

impl HistogramTimer {
    pub fn observe_duration(self) -> Duration {
        let elapsed = self.start.elapsed();
        self.histogram.record(elapsed.as_secs_f64());
        elapsed
    }
}
