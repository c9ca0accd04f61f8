use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Уникальный идентификатор сохранённого объекта
pub type ObjectId = String;

fn default_color() -> String {
    "#b0b0b0".to_string()
}

/// Тип детали. Влияет на геометрию только для `TriangleWall`,
/// у которой площадь основания считается по описанному прямоугольнику.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PartKind {
    Floor,
    Wall,
    Roof,
    Door,
    Window,
    Chimney,
    TriangleWall,
    Pillar,
    Stairs,
    Fence,
    Decoration,
}

impl PartKind {
    /// Все допустимые типы деталей
    pub const ALL: [PartKind; 11] = [
        PartKind::Floor,
        PartKind::Wall,
        PartKind::Roof,
        PartKind::Door,
        PartKind::Window,
        PartKind::Chimney,
        PartKind::TriangleWall,
        PartKind::Pillar,
        PartKind::Stairs,
        PartKind::Fence,
        PartKind::Decoration,
    ];

    /// Имя типа в том виде, в каком оно приходит от генератора
    pub fn as_str(&self) -> &'static str {
        match self {
            PartKind::Floor => "floor",
            PartKind::Wall => "wall",
            PartKind::Roof => "roof",
            PartKind::Door => "door",
            PartKind::Window => "window",
            PartKind::Chimney => "chimney",
            PartKind::TriangleWall => "triangleWall",
            PartKind::Pillar => "pillar",
            PartKind::Stairs => "stairs",
            PartKind::Fence => "fence",
            PartKind::Decoration => "decoration",
        }
    }

    /// Разбор имени типа; `None` для неизвестных тегов
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

/// Деталь — один геометрический примитив объекта.
/// Координаты локальные: x вправо, y вверх, z вперёд.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(rename = "type")]
    pub kind: PartKind,
    pub position: [f64; 3],
    /// Углы в радианах; на площадь основания влияет только y (рыскание)
    #[serde(default)]
    pub rotation: [f64; 3],
    /// Ширина, высота, глубина
    pub size: [f64; 3],
    /// Только для отображения
    #[serde(default = "default_color")]
    pub color: String,
}

impl Part {
    pub fn new(kind: PartKind, position: [f64; 3], size: [f64; 3]) -> Self {
        Self {
            kind,
            position,
            rotation: [0.0; 3],
            size,
            color: default_color(),
        }
    }

    pub fn with_yaw(mut self, yaw: f64) -> Self {
        self.rotation[1] = yaw;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Рыскание детали (радианы)
    pub fn yaw(&self) -> f64 {
        self.rotation[1]
    }
}

/// Объект-постройка: непустой упорядоченный список деталей
/// плюс необязательное положение в мире и поворот.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingObject {
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f64; 3]>,
}

impl BuildingObject {
    pub fn new(parts: Vec<Part>) -> Self {
        Self {
            parts,
            position: None,
            rotation: None,
        }
    }

    /// Канонический минимальный объект — результат явного сброса
    pub fn canonical_default() -> Self {
        Self::new(vec![Part::new(
            PartKind::Floor,
            [0.0, 0.0, 0.0],
            [4.0, 0.2, 4.0],
        )
        .with_color("#8b7355")])
    }

    /// Рыскание объекта в мире (радианы), 0 если не задано
    pub fn yaw(&self) -> f64 {
        self.rotation.map(|r| r[1]).unwrap_or(0.0)
    }

    /// Проверка инвариантов модели для уже типизированного объекта
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.parts.is_empty() {
            return Err(ValidationError::EmptyParts);
        }
        for (index, part) in self.parts.iter().enumerate() {
            for (field, v) in [
                ("position", &part.position),
                ("rotation", &part.rotation),
                ("size", &part.size),
            ] {
                if v.iter().any(|c| !c.is_finite()) {
                    return Err(ValidationError::NonFinite { index, field });
                }
            }
            if part.size.iter().any(|&c| c <= 0.0) {
                return Err(ValidationError::NonPositiveSize { index });
            }
        }
        for (field, v) in [("position", &self.position), ("rotation", &self.rotation)] {
            if v.is_some_and(|v| v.iter().any(|c| !c.is_finite())) {
                return Err(ValidationError::NonFiniteObject { field });
            }
        }
        Ok(())
    }
}

/// Нарушение инвариантов модели в ответе генератора
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("object has no parts")]
    EmptyParts,
    #[error("malformed object: {0}")]
    Malformed(String),
    #[error("part {index}: missing field `{field}`")]
    MissingField { index: usize, field: &'static str },
    #[error("part {index}: `{field}` must have 3 elements, got {len}")]
    VectorLength {
        index: usize,
        field: &'static str,
        len: usize,
    },
    #[error("part {index}: `{field}` must contain only finite numbers")]
    NonFinite { index: usize, field: &'static str },
    #[error("object `{field}` must contain 3 finite numbers")]
    NonFiniteObject { field: &'static str },
    #[error("part {index}: size must be positive")]
    NonPositiveSize { index: usize },
    #[error("part {index}: unknown part type `{kind}`")]
    UnknownPartType { index: usize, kind: String },
}

/// Одно из шести канонических направлений съёмки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewName {
    Top,
    Bottom,
    Left,
    Right,
    Front,
    Back,
}

impl ViewName {
    pub const ALL: [ViewName; 6] = [
        ViewName::Top,
        ViewName::Bottom,
        ViewName::Left,
        ViewName::Right,
        ViewName::Front,
        ViewName::Back,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewName::Top => "top",
            ViewName::Bottom => "bottom",
            ViewName::Left => "left",
            ViewName::Right => "right",
            ViewName::Front => "front",
            ViewName::Back => "back",
        }
    }
}

/// Изображение: MIME-тип + данные в base64
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub media_type: String,
    pub data: String,
}

impl ImagePayload {
    /// Разбор `data:image/png;base64,...`
    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (header, data) = rest.split_once(',')?;
        let media_type = header.strip_suffix(";base64")?;
        if media_type.is_empty() || data.is_empty() {
            return None;
        }
        Some(Self {
            media_type: media_type.to_string(),
            data: data.to_string(),
        })
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// Набор изображений по видам (может быть неполным)
pub type ViewImages = BTreeMap<ViewName, ImagePayload>;

/// Оценка одного вида
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewScore {
    pub score: u8,
    pub comment: String,
}

/// Итог сравнения: оценки всех шести видов + общая оценка
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub views: BTreeMap<ViewName, ViewScore>,
    pub overall_score: u8,
}

/// Что записывается в хранилище после размещения
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRecord {
    pub position: [f64; 3],
    pub rotation: [f64; 3],
    pub bounding_box: [f64; 3],
}

/// Разница между предыдущей и новой версией объекта (по деталям)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PartDiff {
    pub kept: usize,
    pub removed: Vec<Part>,
    pub added: Vec<Part>,
}

impl PartDiff {
    pub fn is_unchanged(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// Роль сообщения в истории диалога
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Сообщение истории; ответ ассистента несёт сгенерированный объект
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<BuildingObject>,
}

/// Запрос к чату генерации
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

/// Ответ чата: текст + принятый объект (если генерация удалась)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<BuildingObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footprint: Option<[u32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<PartDiff>,
}

/// Сохранённый объект
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObject {
    pub id: ObjectId,
    pub name: String,
    pub object: BuildingObject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<ScoreResult>,
}

/// Запрос на сохранение объекта
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateObjectRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub object: BuildingObject,
}

/// Запрос на фиксацию размещения; поворот в радианах
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRequest {
    pub position: [f64; 3],
    #[serde(default)]
    pub rotation: [f64; 3],
}

/// Запрос на оценку: снимки пользователя и эталона по видам
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub user_views: ViewImages,
    pub reference_views: ViewImages,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_kind_round_trip_names() {
        for kind in PartKind::ALL {
            assert_eq!(PartKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(PartKind::parse("spaceship"), None);
    }

    #[test]
    fn test_part_json_uses_type_tag_and_defaults() {
        let json = r#"{"type": "triangleWall", "position": [0, 1, 0], "size": [4, 2, 0.2]}"#;
        let part: Part = serde_json::from_str(json).unwrap();
        assert_eq!(part.kind, PartKind::TriangleWall);
        assert_eq!(part.rotation, [0.0; 3]);
        assert_eq!(part.color, "#b0b0b0");

        let back = serde_json::to_value(&part).unwrap();
        assert_eq!(back["type"], "triangleWall");
    }

    #[test]
    fn test_validate_rejects_empty_and_degenerate() {
        assert_eq!(
            BuildingObject::new(vec![]).validate(),
            Err(ValidationError::EmptyParts)
        );

        let flat = BuildingObject::new(vec![Part::new(PartKind::Wall, [0.0; 3], [1.0, 0.0, 1.0])]);
        assert_eq!(
            flat.validate(),
            Err(ValidationError::NonPositiveSize { index: 0 })
        );

        let nan_part = Part::new(PartKind::Wall, [f64::NAN, 0.0, 0.0], [1.0; 3]);
        let nan = BuildingObject::new(vec![nan_part]);
        assert!(matches!(
            nan.validate(),
            Err(ValidationError::NonFinite { field: "position", .. })
        ));

        assert!(BuildingObject::canonical_default().validate().is_ok());
    }

    #[test]
    fn test_data_url_parsing() {
        let img = ImagePayload::from_data_url("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(img.media_type, "image/png");
        assert_eq!(img.data, "iVBORw0KGgo=");
        assert_eq!(img.to_data_url(), "data:image/png;base64,iVBORw0KGgo=");

        assert!(ImagePayload::from_data_url("image/png;base64,abc").is_none());
        assert!(ImagePayload::from_data_url("data:image/png,abc").is_none());
        assert!(ImagePayload::from_data_url("data:;base64,abc").is_none());
    }

    #[test]
    fn test_score_result_serializes_view_keys() {
        let mut views = BTreeMap::new();
        views.insert(
            ViewName::Front,
            ViewScore {
                score: 70,
                comment: "ok".into(),
            },
        );
        let result = ScoreResult {
            views,
            overall_score: 12,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["views"]["front"]["score"], 70);
        assert_eq!(json["overall_score"], 12);
    }
}
