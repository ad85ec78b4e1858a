//! Adobe Camera Raw tone-curve XMP codec.
//!
//! Presets are exchanged as XMP sidecars carrying a name, a saturation
//! attribute and four `crs:ToneCurvePV2012*` point lists. Points are
//! stored as integer `"x, y"` pairs in sample space (`0..=255`, y up),
//! so a canvas point `(x, y)` becomes `(round(x * 255), round((1 - y) * 255))`.
//!
//! # Encoding
//!
//! [`encode`] always emits the same skeleton with `\n` line endings and
//! no trailing newline:
//!
//! ```text
//! <x:xmpmeta xmlns:x="adobe:ns:meta/">
//! <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
//! <rdf:Description rdf:about="" xmlns:crs="..." crs:Version="18.1" crs:Saturation="0" crs:HasSettings="True">
//! <crs:Name>
//! <rdf:Alt>
//! <rdf:li xml:lang="x-default">New Preset</rdf:li>
//! </rdf:Alt>
//! </crs:Name>
//! <crs:ToneCurvePV2012>
//! <rdf:Seq>
//! <rdf:li>0, 0</rdf:li>
//! <rdf:li>255, 255</rdf:li>
//! </rdf:Seq>
//! </crs:ToneCurvePV2012>
//! ...Red, Green, Blue...
//! </rdf:Description>
//! </rdf:RDF>
//! </x:xmpmeta>
//! ```
//!
//! # Decoding
//!
//! [`decode`] never fails. Unknown elements are ignored, each field falls
//! back to its default on its own, and a document quick-xml rejects
//! yields [`CurvePreset::default`].
//!
//! # Example
//!
//! ```rust
//! use lumen_lut::{xmp, CurvePreset};
//!
//! let p = CurvePreset::new("Fade").with_saturation(-20);
//! let text = xmp::encode(&p);
//! assert_eq!(xmp::decode(&text), p);
//! assert_eq!(xmp::decode("not xml <<<"), CurvePreset::default());
//! ```

use std::fs;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{trace, warn};

use crate::error::LutResult;
use crate::model::{Channel, MAX_SATURATION, MIN_SATURATION};
use crate::preset::CurvePreset;
use crate::spline::{ControlPoint, Spline};

const CRS_NS: &str = "http://ns.adobe.com/camera-raw-settings/1.0/";
const CRS_VERSION: &str = "18.1";

/// Curve element name for a channel.
pub fn curve_tag(channel: Channel) -> &'static str {
    match channel {
        Channel::Rgb => "ToneCurvePV2012",
        Channel::Red => "ToneCurvePV2012Red",
        Channel::Green => "ToneCurvePV2012Green",
        Channel::Blue => "ToneCurvePV2012Blue",
    }
}

fn channel_for_tag(qname: &[u8]) -> Option<Channel> {
    let local = qname.strip_prefix(b"crs:")?;
    Channel::ALL.into_iter().find(|&c| curve_tag(c).as_bytes() == local)
}

// ============================================================================
// Encoder
// ============================================================================

/// Serializes a preset to XMP text.
pub fn encode(preset: &CurvePreset) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str("<x:xmpmeta xmlns:x=\"adobe:ns:meta/\">\n");
    out.push_str("<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\">\n");
    out.push_str(&format!(
        "<rdf:Description rdf:about=\"\" xmlns:crs=\"{CRS_NS}\" crs:Version=\"{CRS_VERSION}\" crs:Saturation=\"{}\" crs:HasSettings=\"True\">\n",
        preset.saturation
    ));
    out.push_str("<crs:Name>\n<rdf:Alt>\n<rdf:li xml:lang=\"x-default\">");
    out.push_str(&quick_xml::escape::escape(preset.name.as_str()));
    out.push_str("</rdf:li>\n</rdf:Alt>\n</crs:Name>\n");
    for channel in Channel::ALL {
        write_curve(&mut out, curve_tag(channel), preset.spline(channel));
    }
    out.push_str("</rdf:Description>\n</rdf:RDF>\n</x:xmpmeta>");
    out
}

fn write_curve(out: &mut String, tag: &str, spline: &Spline) {
    out.push_str(&format!("<crs:{tag}>\n<rdf:Seq>\n"));
    for p in spline.points() {
        let (x, y) = to_sample(*p);
        out.push_str(&format!("<rdf:li>{x}, {y}</rdf:li>\n"));
    }
    out.push_str(&format!("</rdf:Seq>\n</crs:{tag}>\n"));
}

/// Canvas point to the stored integer pair.
#[inline]
fn to_sample(p: ControlPoint) -> (i32, i32) {
    ((p.x * 255.0).round() as i32, ((1.0 - p.y) * 255.0).round() as i32)
}

// ============================================================================
// Decoder
// ============================================================================

/// Parses XMP text into a preset. Never fails.
pub fn decode(text: &str) -> CurvePreset {
    match parse(text) {
        Ok(preset) => preset,
        Err(e) => {
            warn!(error = %e, "malformed XMP, using default preset");
            CurvePreset::default()
        }
    }
}

/// Reads and decodes an XMP file.
///
/// # Errors
///
/// Only file access fails; content problems degrade as in [`decode`].
pub fn read_xmp(path: &Path) -> LutResult<CurvePreset> {
    let bytes = fs::read(path)?;
    Ok(decode(&String::from_utf8_lossy(&bytes)))
}

/// Encodes a preset and writes it to `path`.
pub fn write_xmp(path: &Path, preset: &CurvePreset) -> LutResult<()> {
    fs::write(path, encode(preset))?;
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Capture {
    Name,
    Point,
    Saturation,
}

#[derive(Default)]
struct Decoder {
    name: Option<String>,
    saturation: Option<i32>,
    curves: [Option<Vec<ControlPoint>>; 4],
    block: Option<Channel>,
    in_name: bool,
    capture: Option<Capture>,
    text: String,
}

impl Decoder {
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) {
        if self.saturation.is_none() {
            if let Some(v) = get_attr(e, b"crs:Saturation") {
                self.saturation = Some(parse_saturation(&v));
            }
        }
        if empty {
            return;
        }
        let qname = e.name();
        match qname.as_ref() {
            b"crs:Name" => self.in_name = true,
            b"crs:Saturation" if self.saturation.is_none() => self.begin(Capture::Saturation),
            b"rdf:li" => {
                if self.in_name && self.name.is_none() {
                    self.begin(Capture::Name);
                } else if self.block.is_some() {
                    self.begin(Capture::Point);
                }
            }
            tag => {
                if let Some(ch) = channel_for_tag(tag) {
                    let slot = &mut self.curves[ch.index()];
                    // Only the first block per channel counts.
                    if slot.is_none() {
                        *slot = Some(Vec::new());
                        self.block = Some(ch);
                    }
                }
            }
        }
    }

    fn begin(&mut self, capture: Capture) {
        self.capture = Some(capture);
        self.text.clear();
    }

    fn close(&mut self, qname: &[u8]) {
        match qname {
            b"crs:Name" => self.in_name = false,
            b"crs:Saturation" if self.capture == Some(Capture::Saturation) => {
                self.saturation = Some(parse_saturation(&self.text));
                self.capture = None;
            }
            b"rdf:li" => match self.capture.take() {
                Some(Capture::Name) => self.name = Some(self.text.trim().to_string()),
                Some(Capture::Point) => {
                    if let (Some(ch), Some(p)) = (self.block, parse_point(&self.text)) {
                        if let Some(points) = self.curves[ch.index()].as_mut() {
                            points.push(p);
                        }
                    } else {
                        trace!(item = %self.text, "skipping curve point");
                    }
                }
                _ => {}
            },
            tag => {
                if self.block.is_some() && channel_for_tag(tag) == self.block {
                    self.block = None;
                }
            }
        }
    }

    fn push_text(&mut self, s: &str) {
        if self.capture.is_some() {
            self.text.push_str(s);
        }
    }

    fn finish(self) -> CurvePreset {
        let mut preset = CurvePreset::default();
        if let Some(name) = self.name {
            preset.name = name;
        }
        preset.saturation = self.saturation.unwrap_or(0);
        let [rgb, red, green, blue] = self.curves;
        preset.rgb = Spline::from_points(rgb.unwrap_or_default());
        preset.red = Spline::from_points(red.unwrap_or_default());
        preset.green = Spline::from_points(green.unwrap_or_default());
        preset.blue = Spline::from_points(blue.unwrap_or_default());
        preset
    }
}

fn parse(text: &str) -> Result<CurvePreset, quick_xml::Error> {
    // No trim_text: names keep the spacing around entity references.
    let mut xml = Reader::from_str(text);
    let mut state = Decoder::default();

    loop {
        match xml.read_event()? {
            Event::Start(e) => state.open(&e, false),
            Event::Empty(e) => state.open(&e, true),
            Event::End(e) => state.close(e.name().as_ref()),
            Event::Text(e) => state.push_text(&e.decode().unwrap_or_default()),
            Event::CData(e) => state.push_text(&String::from_utf8_lossy(&e)),
            Event::GeneralRef(e) => {
                let entity = String::from_utf8_lossy(&e);
                if let Some(s) = resolve_entity(&entity) {
                    state.push_text(&s);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(state.finish())
}

fn get_attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

fn resolve_entity(name: &str) -> Option<String> {
    if let Some(code) = name.strip_prefix('#') {
        let n = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => code.parse().ok()?,
        };
        return char::from_u32(n).map(String::from);
    }
    quick_xml::escape::resolve_predefined_entity(name).map(str::to_string)
}

/// Integer saturation; decimals truncate, garbage is 0, range is clamped.
fn parse_saturation(s: &str) -> i32 {
    let s = s.trim();
    let v = s.parse::<i32>().ok().or_else(|| {
        s.parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| v as i32)
    });
    v.unwrap_or(0).clamp(MIN_SATURATION, MAX_SATURATION)
}

/// `"x, y"` sample pair to a canvas point.
fn parse_point(s: &str) -> Option<ControlPoint> {
    let (x, y) = s.split_once(',')?;
    let x: u32 = x.trim().parse().ok()?;
    let y: u32 = y.trim().parse().ok()?;
    Some(ControlPoint::new(x as f32 / 255.0, 1.0 - y as f32 / 255.0))
}
