//! 文本坐标解析：每行 `名称 - 纬度 | 经度`，度 / 分 / 千分之一分 记法。

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use topmarks_core::geometry::{Axis, DmsComponents, GeoPoint};
use tracing::trace;

/// 度、分、千分位任意以空格或句点分隔，半球字母可省略。
static LOOSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(.+?)\s*[-–]\s*([SN]?)([0-9]{2,3})[ .]([0-9]{2})[ .]([0-9]{3})\s*\|\s*([EW]?)([0-9]{3})[ .]([0-9]{2})[ .]([0-9]{3})$",
    )
    .expect("loose coordinate pattern")
});

/// 严格点分格式，纬度度数固定三位。
static STRICT_DOTTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(.+?)\s*[-–]\s*([SN])([0-9]{3})\.([0-9]{2})\.([0-9]{3})\s*\|\s*([EW])([0-9]{3})\.([0-9]{2})\.([0-9]{3})$",
    )
    .expect("strict dotted coordinate pattern")
});

/// 点分格式，纬度度数两到三位。
static DOTTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(.+?)\s*[-–]\s*([SN])([0-9]{2,3})\.([0-9]{2})\.([0-9]{3})\s*\|\s*([EW])([0-9]{3})\.([0-9]{2})\.([0-9]{3})$",
    )
    .expect("dotted coordinate pattern")
});

type Matcher = fn(&str) -> Option<LineCapture<'_>>;

/// 按顺序尝试，首个命中者生效。
const GRAMMARS: [(&str, Matcher); 3] = [
    ("loose", match_loose),
    ("strict_dotted", match_strict_dotted),
    ("dotted", match_dotted),
];

fn match_loose(line: &str) -> Option<LineCapture<'_>> {
    LineCapture::from_regex(&LOOSE, line)
}

fn match_strict_dotted(line: &str) -> Option<LineCapture<'_>> {
    LineCapture::from_regex(&STRICT_DOTTED, line)
}

fn match_dotted(line: &str) -> Option<LineCapture<'_>> {
    LineCapture::from_regex(&DOTTED, line)
}

/// 单个角度分量的原始捕获。
#[derive(Debug, Clone, Copy)]
struct AngleCapture<'a> {
    hemisphere: Option<char>,
    degrees: &'a str,
    minutes: &'a str,
    thousandths: &'a str,
}

impl AngleCapture<'_> {
    fn to_decimal(self, axis: Axis) -> Option<f64> {
        // 匹配不区分大小写，但只有大写 `S` / `W` 取负号。
        let (_, negative_letter) = axis.hemisphere_letters();
        let negative = self.hemisphere == Some(negative_letter);
        let components = DmsComponents::new(
            negative,
            self.degrees.parse().ok()?,
            self.minutes.parse().ok()?,
            self.thousandths.parse().ok()?,
        );
        Some(components.to_decimal())
    }
}

#[derive(Debug, Clone, Copy)]
struct LineCapture<'a> {
    name: &'a str,
    lat: AngleCapture<'a>,
    lng: AngleCapture<'a>,
}

impl<'a> LineCapture<'a> {
    fn from_regex(regex: &Regex, line: &'a str) -> Option<Self> {
        let caps = regex.captures(line)?;
        Some(Self {
            name: caps.get(1)?.as_str(),
            lat: angle(&caps, 2)?,
            lng: angle(&caps, 6)?,
        })
    }

    fn into_point(self) -> Option<GeoPoint> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        Some(GeoPoint::new(
            name,
            self.lat.to_decimal(Axis::Latitude)?,
            self.lng.to_decimal(Axis::Longitude)?,
        ))
    }
}

fn angle<'a>(caps: &Captures<'a>, first: usize) -> Option<AngleCapture<'a>> {
    Some(AngleCapture {
        hemisphere: caps.get(first).and_then(|m| m.as_str().chars().next()),
        degrees: caps.get(first + 1)?.as_str(),
        minutes: caps.get(first + 2)?.as_str(),
        thousandths: caps.get(first + 3)?.as_str(),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// 开启后拒绝 |lat| > 90 或 |lng| > 180 的坐标。
    pub validate_ranges: bool,
}

/// 被丢弃的行，行号从 1 开始，对应原始文本。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    pub line_number: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport {
    pub points: Vec<GeoPoint>,
    /// 去除空行后的行数。
    pub candidate_lines: usize,
    pub rejected: Vec<RejectedLine>,
}

impl ParseReport {
    #[inline]
    pub fn parsed_count(&self) -> usize {
        self.points.len()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateParser {
    options: ParserOptions,
}

impl CoordinateParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParserOptions) -> Self {
        Self { options }
    }

    #[inline]
    pub fn options(&self) -> ParserOptions {
        self.options
    }

    /// 解析单行；无法匹配时返回 `None`。
    pub fn parse_line(&self, line: &str) -> Option<GeoPoint> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let point = GRAMMARS.iter().find_map(|(grammar, matcher)| {
            let point = matcher(line)?.into_point()?;
            trace!(grammar = *grammar, name = %point.name, "坐标行匹配成功");
            Some(point)
        })?;
        if self.options.validate_ranges && !point.is_within_range() {
            trace!(name = %point.name, lat = point.lat, lng = point.lng, "坐标超出范围，已丢弃");
            return None;
        }
        Some(point)
    }

    /// 逐行解析，保持输入顺序并跳过空行与无法识别的行。
    pub fn parse_batch(&self, text: &str) -> Vec<GeoPoint> {
        candidate_lines(text)
            .filter_map(|(_, line)| self.parse_line(line))
            .collect()
    }

    pub fn parse_report(&self, text: &str) -> ParseReport {
        let mut report = ParseReport::default();
        for (index, line) in candidate_lines(text) {
            report.candidate_lines += 1;
            match self.parse_line(line) {
                Some(point) => report.points.push(point),
                None => report.rejected.push(RejectedLine {
                    line_number: index + 1,
                    text: line.to_string(),
                }),
            }
        }
        report
    }
}

fn candidate_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .map(str::trim)
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
}

/// 使用默认（宽松）选项解析单行。
pub fn parse_line(line: &str) -> Option<GeoPoint> {
    CoordinateParser::new().parse_line(line)
}

pub fn parse_batch(text: &str) -> Vec<GeoPoint> {
    CoordinateParser::new().parse_batch(text)
}

/// 将坐标点格式化为可再次解析的点分文本，例如 `Reef - S38.06.123 | E144.48.456`。
pub fn format_line(point: &GeoPoint) -> String {
    let lat = DmsComponents::from_decimal(point.lat);
    let lng = DmsComponents::from_decimal(point.lng);
    format!(
        "{} - {}{:02}.{:02}.{:03} | {}{:03}.{:02}.{:03}",
        point.name,
        lat.hemisphere(Axis::Latitude),
        lat.degrees,
        lat.minutes,
        lat.thousandths,
        lng.hemisphere(Axis::Longitude),
        lng.degrees,
        lng.minutes,
        lng.thousandths,
    )
}
