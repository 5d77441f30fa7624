//! Minimal osu! API v1 client covering the two endpoints the bot needs.

use crate::{
    config, log_internal,
    osu::{mods::LegacyMods, rescore::ScoreStatistics},
    pipeline::PlaySource,
};
use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde_with::{serde_as, DisplayFromStr};

/// osu!standard
const RULESET: &str = "0";

/// Response element of `get_user`
#[serde_as]
#[derive(Clone, Debug, serde::Deserialize)]
pub struct UserProfile {
    pub username: String,
    /// Null for players who haven't set any ranked play yet
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub pp_raw: Option<f64>,
}

impl UserProfile {
    pub fn total_pp(&self) -> f64 {
        self.pp_raw.unwrap_or(0.0)
    }
}

/// Response element of `get_user_best`
#[serde_as]
#[derive(Clone, Debug, serde::Deserialize)]
pub struct TopPlay {
    #[serde_as(as = "DisplayFromStr")]
    pub beatmap_id: u32,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(rename = "maxcombo")]
    pub max_combo: u32,
    #[serde_as(as = "DisplayFromStr")]
    pub count300: u32,
    #[serde_as(as = "DisplayFromStr")]
    pub count100: u32,
    #[serde_as(as = "DisplayFromStr")]
    pub count50: u32,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(rename = "countmiss")]
    pub count_miss: u32,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(rename = "countkatu")]
    pub count_katu: u32,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(rename = "countgeki")]
    pub count_geki: u32,
    #[serde_as(as = "DisplayFromStr")]
    pub enabled_mods: u32,
    #[serde_as(as = "DisplayFromStr")]
    pub pp: f64,
}

impl TopPlay {
    pub fn mods(&self) -> LegacyMods {
        LegacyMods::from_api(self.enabled_mods)
    }

    pub fn statistics(&self) -> ScoreStatistics {
        ScoreStatistics {
            max_combo: self.max_combo,
            n300: self.count300,
            n100: self.count100,
            n50: self.count50,
            misses: self.count_miss,
            n_geki: self.count_geki,
            n_katu: self.count_katu,
        }
    }
}

pub struct OsuApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OsuApi {
    pub fn new(client: reqwest::Client, cfg: &config::Osu) -> Self {
        Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            api_key: cfg.api_key.clone(),
        }
    }

    /// Errors never carry the request url since its query contains the API key
    async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/api/{}", self.base_url, endpoint);

        log_internal!("Requesting osu! API endpoint {}... ", endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[("k", self.api_key.as_str()), ("m", RULESET)])
            .query(query)
            .send()
            .await
            .map_err(|e| {
                anyhow!(
                    "Could not reach osu! API endpoint `{}`: {}",
                    endpoint,
                    e.without_url()
                )
            })?
            .error_for_status()
            .map_err(|e| anyhow!("osu! API endpoint `{}` failed: {}", endpoint, e.without_url()))?
            .json::<T>()
            .await
            .map_err(|e| {
                anyhow!(
                    "Could not decode osu! API `{}` response: {}",
                    endpoint,
                    e.without_url()
                )
            })?;
        log_internal!("Requesting osu! API endpoint {}... done", endpoint);

        Ok(response)
    }
}

#[serenity::async_trait]
impl PlaySource for OsuApi {
    async fn user(&self, name: &str) -> Result<UserProfile> {
        let users: Vec<UserProfile> = self.get("get_user", &[("u", name)]).await?;

        users
            .into_iter()
            .next()
            .ok_or(anyhow!("User `{}` was not found", name))
    }

    async fn top_plays(&self, name: &str, limit: u8) -> Result<Vec<TopPlay>> {
        let limit = limit.to_string();
        self.get("get_user_best", &[("u", name), ("limit", limit.as_str())])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osu::test_server;

    const SECRET: &str = "SECRET";

    fn api(base_url: &str) -> OsuApi {
        let cfg = config::Osu {
            api_key: SECRET.to_owned(),
            base_url: base_url.to_owned(),
            top_plays_limit: 100,
        };
        OsuApi::new(reqwest::Client::new(), &cfg)
    }

    #[tokio::test]
    async fn unreachable_server_error_hides_api_key() {
        let err = api(test_server::UNREACHABLE).user("peppy").await.unwrap_err();

        let text = format!("{:#}", err);
        assert!(text.contains("get_user"));
        assert!(!text.contains(SECRET));
    }

    #[tokio::test]
    async fn error_status_hides_api_key() {
        let server = test_server::serve(500, b"").await;

        let err = api(&server.base_url)
            .top_plays("peppy", 100)
            .await
            .unwrap_err();

        let text = format!("{:#}", err);
        assert!(text.contains("get_user_best"));
        assert!(!text.contains(SECRET));
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn undecodable_response_hides_api_key() {
        let server = test_server::serve(200, b"<html>maintenance</html>").await;

        let err = api(&server.base_url).user("peppy").await.unwrap_err();
        assert!(!format!("{:#}", err).contains(SECRET));
    }

    #[tokio::test]
    async fn empty_user_response_is_not_found() {
        let server = test_server::serve(200, b"[]").await;

        let err = api(&server.base_url).user("nobody").await.unwrap_err();
        assert_eq!(err.to_string(), "User `nobody` was not found");
    }

    #[test]
    fn decode_user() {
        let users: Vec<UserProfile> = serde_json::from_str(
            r#"[{
                "user_id": "2",
                "username": "peppy",
                "count300": "12345",
                "playcount": "678",
                "pp_raw": "1234.56",
                "accuracy": "97.1234"
            }]"#,
        )
        .unwrap();

        assert_eq!(users[0].username, "peppy");
        assert_eq!(users[0].total_pp(), 1234.56);
    }

    #[test]
    fn decode_user_without_pp() {
        let users: Vec<UserProfile> = serde_json::from_str(
            r#"[{ "user_id": "3", "username": "fresh", "pp_raw": null }]"#,
        )
        .unwrap();

        assert_eq!(users[0].total_pp(), 0.0);
    }

    #[test]
    fn decode_top_play() {
        let plays: Vec<TopPlay> = serde_json::from_str(
            r#"[{
                "beatmap_id": "129891",
                "score_id": "2177560145",
                "score": "132408001",
                "maxcombo": "2385",
                "count50": "0",
                "count100": "5",
                "count300": "1978",
                "countmiss": "0",
                "countkatu": "5",
                "countgeki": "247",
                "perfect": "0",
                "enabled_mods": "24",
                "user_id": "124493",
                "date": "2016-03-07 20:36:33",
                "rank": "SH",
                "pp": "915.072",
                "replay_available": "1"
            }]"#,
        )
        .unwrap();

        let play = &plays[0];
        assert_eq!(play.beatmap_id, 129891);
        assert_eq!(play.pp, 915.072);
        assert_eq!(play.mods(), LegacyMods::HIDDEN | LegacyMods::HARD_ROCK);

        let stats = play.statistics();
        assert_eq!(stats.max_combo, 2385);
        assert_eq!(stats.n300, 1978);
        assert_eq!(stats.n100, 5);
        assert_eq!(stats.n_geki, 247);
        assert_eq!(stats.n_katu, 5);
    }
}
