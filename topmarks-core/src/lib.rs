pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    pub const MAX_LATITUDE: f64 = 90.0;
    pub const MAX_LONGITUDE: f64 = 180.0;

    /// 带名称的地理坐标点，纬度与经度均为十进制度数。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct GeoPoint {
        pub name: String,
        pub lat: f64,
        pub lng: f64,
    }

    impl GeoPoint {
        #[inline]
        pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
            Self {
                name: name.into(),
                lat,
                lng,
            }
        }

        /// 以 `DVec2(lat, lng)` 形式返回坐标。
        #[inline]
        pub fn position(&self) -> DVec2 {
            DVec2::new(self.lat, self.lng)
        }

        /// 纬度位于 [-90, 90] 且经度位于 [-180, 180]。
        pub fn is_within_range(&self) -> bool {
            self.lat.abs() <= MAX_LATITUDE && self.lng.abs() <= MAX_LONGITUDE
        }
    }

    /// 坐标轴，决定半球字母的取值。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Axis {
        Latitude,
        Longitude,
    }

    impl Axis {
        /// 返回 (正半球字母, 负半球字母)。
        #[inline]
        pub fn hemisphere_letters(self) -> (char, char) {
            match self {
                Axis::Latitude => ('N', 'S'),
                Axis::Longitude => ('E', 'W'),
            }
        }
    }

    /// 度 / 分 / 千分之一分 的分解形式。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DmsComponents {
        pub negative: bool,
        pub degrees: u32,
        pub minutes: u32,
        pub thousandths: u32,
    }

    impl DmsComponents {
        pub fn new(negative: bool, degrees: u32, minutes: u32, thousandths: u32) -> Self {
            Self {
                negative,
                degrees,
                minutes,
                thousandths,
            }
        }

        /// 将十进制度数拆分为度、分、千分之一分；千分位四舍五入并向上进位。
        pub fn from_decimal(value: f64) -> Self {
            let negative = value < 0.0;
            let magnitude = value.abs();
            let mut degrees = magnitude.trunc() as u32;
            let total_minutes = (magnitude - degrees as f64) * 60.0;
            let mut minutes = total_minutes.trunc() as u32;
            let mut thousandths = ((total_minutes - minutes as f64) * 1000.0).round() as u32;

            if thousandths >= 1000 {
                thousandths -= 1000;
                minutes += 1;
            }
            if minutes >= 60 {
                minutes -= 60;
                degrees += 1;
            }

            Self {
                negative,
                degrees,
                minutes,
                thousandths,
            }
        }

        pub fn to_decimal(self) -> f64 {
            let magnitude =
                self.degrees as f64 + self.minutes as f64 / 60.0 + self.thousandths as f64 / 60_000.0;
            if self.negative { -magnitude } else { magnitude }
        }

        #[inline]
        pub fn hemisphere(self, axis: Axis) -> char {
            let (positive, negative) = axis.hemisphere_letters();
            if self.negative { negative } else { positive }
        }
    }

    /// 经纬度轴对齐范围，`x` 为纬度，`y` 为经度。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct GeoBounds {
        min: DVec2,
        max: DVec2,
    }

    impl GeoBounds {
        pub fn empty() -> Self {
            Self {
                min: DVec2::splat(f64::INFINITY),
                max: DVec2::splat(f64::NEG_INFINITY),
            }
        }

        pub fn from_points<'a>(points: impl IntoIterator<Item = &'a GeoPoint>) -> Self {
            let mut bounds = Self::empty();
            for point in points {
                bounds.include_point(point);
            }
            bounds
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x > self.max.x || self.min.y > self.max.y
        }

        pub fn include_point(&mut self, point: &GeoPoint) {
            let position = point.position();
            self.min = self.min.min(position);
            self.max = self.max.max(position);
        }

        pub fn include_bounds(&mut self, other: &GeoBounds) {
            if other.is_empty() {
                return;
            }
            self.min = self.min.min(other.min);
            self.max = self.max.max(other.max);
        }

        /// 范围中心 (lat, lng)；空范围返回 `None`。
        pub fn center(&self) -> Option<(f64, f64)> {
            if self.is_empty() {
                return None;
            }
            let center = (self.min + self.max) * 0.5;
            Some((center.x, center.y))
        }

        #[inline]
        pub fn min(&self) -> DVec2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> DVec2 {
            self.max
        }
    }

    impl Default for GeoBounds {
        fn default() -> Self {
            Self::empty()
        }
    }

}

pub mod model {
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    use crate::geometry::{GeoBounds, GeoPoint};

    pub const DEFAULT_FOLDER_ID: &str = "default";
    pub const DEFAULT_FOLDER_NAME: &str = "Default Folder";

    /// 生成新的随机 ID（UUID v4 字符串）。
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// 一次粘贴 / 导入产生的有序坐标集合。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Layer {
        pub id: String,
        pub name: String,
        pub marks: Vec<GeoPoint>,
    }

    impl Layer {
        pub fn new(name: impl Into<String>, marks: Vec<GeoPoint>) -> Self {
            Self::with_id(new_id(), name, marks)
        }

        pub fn with_id(id: impl Into<String>, name: impl Into<String>, marks: Vec<GeoPoint>) -> Self {
            Self {
                id: id.into(),
                name: name.into(),
                marks,
            }
        }

        pub fn bounds(&self) -> GeoBounds {
            GeoBounds::from_points(&self.marks)
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Folder {
        pub id: String,
        pub name: String,
        #[serde(default)]
        pub layers: Vec<Layer>,
    }

    impl Folder {
        pub fn new(name: impl Into<String>) -> Self {
            Self::with_id(new_id(), name)
        }

        pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
            Self {
                id: id.into(),
                name: name.into(),
                layers: Vec::new(),
            }
        }

        /// 存储缺失或损坏时使用的默认文件夹。
        pub fn default_folder() -> Self {
            Self::with_id(DEFAULT_FOLDER_ID, DEFAULT_FOLDER_NAME)
        }

        pub fn layer(&self, id: &str) -> Option<&Layer> {
            self.layers.iter().find(|layer| layer.id == id)
        }
    }

    /// 文件夹树。所有变更操作都消费旧树并返回新树，未命中的 ID 视为空操作。
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct FolderTree {
        folders: Vec<Folder>,
    }

    impl FolderTree {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn from_folders(folders: Vec<Folder>) -> Self {
            Self { folders }
        }

        /// 仅包含默认文件夹的树。
        pub fn with_default() -> Self {
            Self::from_folders(vec![Folder::default_folder()])
        }

        /// 若树为空则补上默认文件夹。
        #[must_use]
        pub fn ensure_default(self) -> Self {
            if self.folders.is_empty() {
                Self::with_default()
            } else {
                self
            }
        }

        #[must_use]
        pub fn add_folder(mut self, folder: Folder) -> Self {
            self.folders.push(folder);
            self
        }

        #[must_use]
        pub fn remove_folder(mut self, id: &str) -> Self {
            self.folders.retain(|folder| folder.id != id);
            self
        }

        #[must_use]
        pub fn update_folder_name(mut self, id: &str, name: impl Into<String>) -> Self {
            if let Some(folder) = self.folder_mut(id) {
                folder.name = name.into();
            }
            self
        }

        #[must_use]
        pub fn add_layer(mut self, folder_id: &str, layer: Layer) -> Self {
            if let Some(folder) = self.folder_mut(folder_id) {
                folder.layers.push(layer);
            }
            self
        }

        #[must_use]
        pub fn remove_layer(mut self, folder_id: &str, layer_id: &str) -> Self {
            if let Some(folder) = self.folder_mut(folder_id) {
                folder.layers.retain(|layer| layer.id != layer_id);
            }
            self
        }

        #[inline]
        pub fn folders(&self) -> &[Folder] {
            &self.folders
        }

        #[inline]
        pub fn into_folders(self) -> Vec<Folder> {
            self.folders
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.folders.is_empty()
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.folders.len()
        }

        pub fn folder(&self, id: &str) -> Option<&Folder> {
            self.folders.iter().find(|folder| folder.id == id)
        }

        #[inline]
        pub fn contains_folder(&self, id: &str) -> bool {
            self.folder(id).is_some()
        }

        pub fn layer(&self, folder_id: &str, layer_id: &str) -> Option<&Layer> {
            self.folder(folder_id).and_then(|folder| folder.layer(layer_id))
        }

        pub fn folder_ids(&self) -> impl Iterator<Item = &str> + '_ {
            self.folders.iter().map(|folder| folder.id.as_str())
        }

        pub fn layer_ids(&self) -> impl Iterator<Item = &str> + '_ {
            self.folders
                .iter()
                .flat_map(|folder| folder.layers.iter().map(|layer| layer.id.as_str()))
        }

        pub fn layer_count(&self) -> usize {
            self.folders.iter().map(|folder| folder.layers.len()).sum()
        }

        pub fn mark_count(&self) -> usize {
            self.folders
                .iter()
                .flat_map(|folder| folder.layers.iter())
                .map(|layer| layer.marks.len())
                .sum()
        }

        fn folder_mut(&mut self, id: &str) -> Option<&mut Folder> {
            self.folders.iter_mut().find(|folder| folder.id == id)
        }
    }

}
