use crate::config::ClientConfig;
use beaconcore::aggregate::AggregatePayload;
use beaconcore::model::DetectionDataset;
use beaconcore::playback::{FetchRequest, FetchTicket};
use beaconcore::PlaybackError;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct DateQuery {
    year: i32,
    month: u32,
    day: u32,
}

impl From<NaiveDate> for DateQuery {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

fn network(err: reqwest::Error) -> PlaybackError {
    PlaybackError::Network(err.to_string())
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    csrf_token: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.server_url.clone(),
            csrf_token: config.csrf_token.clone(),
        }
    }

    pub async fn detections_for(&self, date: NaiveDate) -> Result<DetectionDataset, PlaybackError> {
        let response = self
            .http
            .post(format!("{}/smart_campus/get_detections_by_date", self.base_url))
            .header("X-CSRFToken", &self.csrf_token)
            .json(&DateQuery::from(date))
            .send()
            .await
            .map_err(network)?;
        let status = response.status();
        let body = response.text().await.map_err(network)?;
        if !status.is_success() {
            return Err(PlaybackError::Network(format!("{}: {}", status, body)));
        }
        DetectionDataset::from_json(&body)
    }

    pub async fn aggregate(&self) -> Result<AggregatePayload, PlaybackError> {
        let response = self
            .http
            .get(format!("{}/smart_campus/get_beacon_detect_data", self.base_url))
            .send()
            .await
            .map_err(network)?;
        let status = response.status();
        let body = response.text().await.map_err(network)?;
        if !status.is_success() {
            return Err(PlaybackError::Network(format!("{}: {}", status, body)));
        }
        AggregatePayload::from_json(&body)
    }
}

/// Performs `request`, giving up as soon as the engine cancels it.
pub async fn fetch_dataset(
    api: ApiClient,
    request: FetchRequest,
) -> (FetchTicket, Result<DetectionDataset, PlaybackError>) {
    let FetchRequest {
        ticket,
        date,
        token,
    } = request;
    let result = tokio::select! {
        biased;
        _ = token.cancelled() => Err(PlaybackError::Cancelled),
        result = api.detections_for(date) => result,
    };
    (ticket, result)
}

pub async fn fetch_aggregate(api: ApiClient) -> Result<AggregatePayload, PlaybackError> {
    api.aggregate().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use beaconcore::playback::PlaybackEngine;
    use beaconcore::PlaybackConfig;

    #[test]
    fn date_query_splits_calendar_fields() {
        let query = DateQuery::from(NaiveDate::from_ymd_opt(2017, 9, 11).unwrap());
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            serde_json::json!({"year": 2017, "month": 9, "day": 11})
        );
    }

    #[tokio::test]
    async fn cancelled_request_resolves_without_network() {
        let mut engine = PlaybackEngine::new(PlaybackConfig::default());
        let today = NaiveDate::from_ymd_opt(2017, 9, 11).unwrap();
        let first = engine.select_date(0, today);
        let _second = engine.select_date(1, today);

        let api = ApiClient::new(&ClientConfig::from_lookup(|key| {
            (key == "BEACON_SERVER_URL").then(|| "http://192.0.2.1:9".to_string())
        }));
        let (ticket, result) = fetch_dataset(api, first.clone()).await;
        assert_eq!(ticket, first.ticket);
        assert_eq!(result.unwrap_err(), PlaybackError::Cancelled);
    }
}
