use crate::{
    error::{InferenceError, PredictError},
    host::ModelHost,
    labels::LabelSource,
    postprocessing::{Prediction, argmax},
    preprocessing::PreProcessor,
};
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

struct PredictionMetrics {
    duration: Histogram<f64>,
    predictions: Counter<u64>,
    failures: Counter<u64>,
}

impl PredictionMetrics {
    fn init(meter_name: &'static str) -> Self {
        let meter = global::meter(meter_name);
        let latency_buckets = [
            0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 0.75, 1.0, 2.0, 5.0,
        ];

        Self {
            duration: meter
                .f64_histogram("prediction_duration_seconds")
                .with_description("Time to classify one upload (decode + infer + label lookup)")
                .with_unit("s")
                .with_boundaries(latency_buckets.to_vec())
                .build(),
            predictions: meter
                .u64_counter("predictions_total")
                .with_description("Total successful predictions")
                .build(),
            failures: meter
                .u64_counter("prediction_failures_total")
                .with_description("Total failed predictions, by failure kind")
                .build(),
        }
    }
}

/// Runs the linear prediction pipeline on one encoded image.
pub struct PredictionService {
    host: Arc<ModelHost>,
    preprocessor: PreProcessor,
    labels: LabelSource,
    metrics: PredictionMetrics,
    cardinality_warned: AtomicBool,
}

impl PredictionService {
    pub fn new(host: ModelHost, preprocessor: PreProcessor, labels: LabelSource) -> Self {
        Self {
            host: Arc::new(host),
            preprocessor,
            labels,
            metrics: PredictionMetrics::init("inference"),
            cardinality_warned: AtomicBool::new(false),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.host.is_ready()
    }

    #[tracing::instrument(skip_all, fields(encoded_bytes = bytes.len()))]
    pub async fn predict(&self, bytes: Vec<u8>) -> Result<Prediction, PredictError> {
        let start = Instant::now();
        let result = self.run_pipeline(bytes).await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(prediction) => {
                self.metrics.duration.record(elapsed, &[]);
                self.metrics.predictions.add(1, &[]);
                tracing::info!(
                    class_index = prediction.class_index,
                    class_name = %prediction.class_name,
                    score = prediction.score,
                    elapsed_ms = elapsed * 1000.0,
                    "Prediction complete"
                );
            }
            Err(e) => {
                self.metrics
                    .failures
                    .add(1, &[KeyValue::new("kind", e.kind())]);
                tracing::warn!(error = %e, kind = e.kind(), "Prediction failed");
            }
        }

        result
    }

    async fn run_pipeline(&self, bytes: Vec<u8>) -> Result<Prediction, PredictError> {
        let host = Arc::clone(&self.host);
        let preprocessor = self.preprocessor;

        // Decoding and the model call are CPU-bound
        let scores = tokio::task::spawn_blocking(move || -> Result<Vec<f32>, PredictError> {
            let input = preprocessor.prepare(&bytes)?;
            Ok(host.classify(&input)?)
        })
        .await
        .map_err(|e| InferenceError::Runtime(format!("inference task failed: {}", e)))??;

        let table = self.labels.table().await?;
        self.check_cardinality(scores.len(), table.len());

        let index = argmax(&scores).ok_or(InferenceError::EmptyOutput)?;
        let class_name = table.get(index).ok_or(PredictError::Lookup {
            index,
            table_len: table.len(),
        })?;

        Ok(Prediction {
            class_index: index,
            class_name: class_name.to_string(),
            score: scores[index],
        })
    }

    fn check_cardinality(&self, outputs: usize, labels: usize) {
        if outputs != labels && !self.cardinality_warned.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                model_outputs = outputs,
                labels,
                "Class index table size does not match the model output width"
            );
        }
    }
}
