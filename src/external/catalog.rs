//! 턴프 카탈로그 (외부 소유 참조 데이터, 읽기 전용)

use std::path::Path;

use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};

/// 턴프 메타데이터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turf {
    pub id: String,
    pub name: String,
    pub city: String,
    pub location: String,
    /// 시간당 가격 (주 통화 단위)
    pub price_per_hour: u64,
    #[serde(default)]
    pub surface: String,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub amenities: Vec<String>,
}

/// 턴프 카탈로그 조회 계약
#[async_trait]
pub trait TurfCatalog: Send + Sync {
    async fn get_turf(&self, turf_id: &str) -> Option<Turf>;

    /// 도시 필터 ("All" 또는 None 이면 전체)
    async fn list_turfs(&self, city: Option<&str>) -> Vec<Turf>;

    /// "All" + 카탈로그 순서대로의 도시 목록
    async fn cities(&self) -> Vec<String>;
}

/// 메모리 카탈로그
pub struct InMemoryTurfCatalog {
    turfs: Vec<Turf>,
}

impl InMemoryTurfCatalog {
    pub fn new(turfs: Vec<Turf>) -> Self {
        Self { turfs }
    }

    /// JSON 배열 파일에서 로드
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let turfs: Vec<Turf> = serde_json::from_str(&raw)?;
        info!("턴프 카탈로그 로드: {}개 ({})", turfs.len(), path.as_ref().display());
        Ok(Self::new(turfs))
    }

    /// 기본 시드 데이터
    pub fn seeded() -> Self {
        let turf = |id: &str, name: &str, city: &str, location: &str, price: u64, surface: &str, rating: f32, amenities: &[&str]| Turf {
            id: id.to_string(),
            name: name.to_string(),
            city: city.to_string(),
            location: location.to_string(),
            price_per_hour: price,
            surface: surface.to_string(),
            rating,
            amenities: amenities.iter().map(|a| a.to_string()).collect(),
        };

        Self::new(vec![
            turf("turf-001", "PlayGround Arena", "Mumbai", "Andheri West", 1500, "Artificial Grass", 4.5,
                 &["Floodlights", "Parking", "Changing Room", "Washroom"]),
            turf("turf-002", "Champions Turf", "Mumbai", "Bandra East", 2000, "Natural Grass", 4.8,
                 &["Floodlights", "Parking", "Changing Room", "Cafeteria", "First Aid"]),
            turf("turf-003", "Sports Hub", "Delhi", "Dwarka", 1200, "Artificial Grass", 4.3,
                 &["Floodlights", "Parking", "Washroom"]),
            turf("turf-004", "Victory Ground", "Bangalore", "Koramangala", 1800, "Hybrid Grass", 4.6,
                 &["Floodlights", "Parking", "Changing Room", "Washroom", "Cafeteria"]),
            turf("turf-005", "Elite Sports Arena", "Bangalore", "Whitefield", 2200, "Premium Artificial Grass", 4.9,
                 &["Floodlights", "Parking", "Changing Room", "Washroom", "Cafeteria", "Pro Shop"]),
            turf("turf-006", "Goal Kick Arena", "Delhi", "Rohini", 1000, "Artificial Grass", 4.1,
                 &["Floodlights", "Parking", "Washroom"]),
        ])
    }
}

#[async_trait]
impl TurfCatalog for InMemoryTurfCatalog {
    async fn get_turf(&self, turf_id: &str) -> Option<Turf> {
        self.turfs.iter().find(|t| t.id == turf_id).cloned()
    }

    async fn list_turfs(&self, city: Option<&str>) -> Vec<Turf> {
        match city {
            Some(city) if city != "All" => self.turfs.iter().filter(|t| t.city == city).cloned().collect(),
            _ => self.turfs.clone(),
        }
    }

    async fn cities(&self) -> Vec<String> {
        let mut cities = vec!["All".to_string()];
        for turf in &self.turfs {
            if !cities.contains(&turf.city) {
                cities.push(turf.city.clone());
            }
        }
        cities
    }
}
