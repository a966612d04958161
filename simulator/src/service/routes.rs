use crate::generator::profile::{build_aggregate, build_day};
use crate::service::model::{DateQuery, ErrorBody};
use crate::workflow::config::SimulatorConfig;
use anyhow::Context;
use beaconcore::aggregate::AggregatePayload;
use chrono::NaiveDate;
use log::{info, warn};
use std::future::Future;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};
use warp::Filter;

pub const CSRF_HEADER: &str = "x-csrftoken";

/// Shared state behind the detection endpoints.
pub struct DetectionService {
    config: SimulatorConfig,
    aggregate: AggregatePayload,
}

impl DetectionService {
    /// Precomputes the aggregate payload for the days ending at `anchor`.
    pub fn new(config: SimulatorConfig, anchor: NaiveDate) -> anyhow::Result<Self> {
        let aggregate = build_aggregate(&config.generator, anchor)
            .context("building aggregate detections")?;
        Ok(Self { config, aggregate })
    }

    fn detections_for(&self, token: Option<String>, query: DateQuery) -> Response {
        if token.as_deref() != Some(self.config.csrf_token.as_str()) {
            warn!("rejecting dated request without a valid CSRF token");
            return error_reply(StatusCode::FORBIDDEN, "CSRF verification failed");
        }
        let Some(date) = query.to_date() else {
            return error_reply(StatusCode::BAD_REQUEST, "invalid date");
        };

        match build_day(&self.config.generator, date) {
            Ok(dataset) => {
                info!(
                    "serving {} samples for {} users on {}",
                    dataset.sample_count(),
                    dataset.user_count(),
                    date
                );
                warp::reply::json(&dataset).into_response()
            }
            Err(err) => {
                warn!("generating {} failed: {:#}", date, err);
                error_reply(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
            }
        }
    }

    /// Serves until `shutdown` resolves.
    pub async fn serve(
        self: Arc<Self>,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let bind = self.config.bind;
        let (addr, server) = warp::serve(routes(self))
            .try_bind_with_graceful_shutdown(bind, shutdown)
            .with_context(|| format!("binding detection service to {}", bind))?;
        info!("detection service listening on http://{}", addr);
        server.await;
        Ok(())
    }
}

fn error_reply(status: StatusCode, message: &str) -> Response {
    warp::reply::with_status(
        warp::reply::json(&ErrorBody {
            error: message.to_string(),
        }),
        status,
    )
    .into_response()
}

pub fn routes(
    service: Arc<DetectionService>,
) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone {
    let service_filter = warp::any().map(move || service.clone());

    let by_date = warp::path!("smart_campus" / "get_detections_by_date")
        .and(warp::post())
        .and(warp::header::optional::<String>(CSRF_HEADER))
        .and(warp::body::json())
        .and(service_filter.clone())
        .map(
            |token: Option<String>, query: DateQuery, service: Arc<DetectionService>| {
                service.detections_for(token, query)
            },
        );

    let aggregate = warp::path!("smart_campus" / "get_beacon_detect_data")
        .and(warp::get())
        .and(service_filter)
        .map(|service: Arc<DetectionService>| warp::reply::json(&service.aggregate));

    by_date.or(aggregate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use beaconcore::model::DetectionDataset;
    use serde_json::json;

    fn service() -> Arc<DetectionService> {
        let mut config = SimulatorConfig::from_args(3, 1, None);
        config.generator.aggregate_days = 1;
        let anchor = NaiveDate::from_ymd_opt(2017, 9, 11).unwrap();
        Arc::new(DetectionService::new(config, anchor).unwrap())
    }

    #[tokio::test]
    async fn dated_request_returns_the_user_grid() {
        let filter = routes(service());
        let response = warp::test::request()
            .method("POST")
            .path("/smart_campus/get_detections_by_date")
            .header(CSRF_HEADER, "smart-campus-dev")
            .json(&json!({"year": 2017, "month": 9, "day": 11}))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = std::str::from_utf8(response.body()).unwrap();
        let dataset = DetectionDataset::from_json(body).unwrap();
        assert_eq!(dataset.user_count(), 3);
    }

    #[tokio::test]
    async fn missing_csrf_token_is_forbidden() {
        let filter = routes(service());
        let response = warp::test::request()
            .method("POST")
            .path("/smart_campus/get_detections_by_date")
            .json(&json!({"year": 2017, "month": 9, "day": 11}))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn invalid_date_is_a_bad_request() {
        let filter = routes(service());
        let response = warp::test::request()
            .method("POST")
            .path("/smart_campus/get_detections_by_date")
            .header(CSRF_HEADER, "smart-campus-dev")
            .json(&json!({"year": 2017, "month": 13, "day": 1}))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn aggregate_endpoint_serves_counts() {
        let filter = routes(service());
        let response = warp::test::request()
            .method("GET")
            .path("/smart_campus/get_beacon_detect_data")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = std::str::from_utf8(response.body()).unwrap();
        let payload = AggregatePayload::from_json(body).unwrap();
        assert!(!payload.data_with_each_detection_cnt.is_empty());
    }
}
