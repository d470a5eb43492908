use crate::config::AppConfig;
use crate::error::AppError;
use crate::metadata::{GeoCoordinate, GeoField, ImageMetadata, TagValue};
use exif::{Context, Exif, Field, In, Reader, Tag, Value};
use image::GenericImageView;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Windows keyword tag, stored as UTF-16LE bytes.
const XP_KEYWORDS: Tag = Tag(Context::Tiff, 0x9c9e);

#[derive(Debug, Clone)]
pub struct TagDecoder {
    allowed_extensions: HashSet<String>,
}

impl TagDecoder {
    pub fn new(config: &AppConfig) -> Self {
        Self { allowed_extensions: config.allowed_extensions.clone() }
    }

    pub fn decode(&self, path: &Path) -> Result<ImageMetadata, AppError> {
        log::debug!("Decoding image tags for: {:?}", path);

        if !path.is_file() {
            return Err(AppError::Resource(format!("{} is not a readable file", path.display())));
        }
        let supported = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| self.allowed_extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false);
        if !supported {
            return Err(AppError::Resource(format!("unsupported image format: {}", path.display())));
        }

        let reader = image::io::Reader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|e| AppError::Resource(format!("could not open {}: {}", path.display(), e)))?;
        let format = reader
            .format()
            .map(|f| format!("{:?}", f))
            .unwrap_or_else(|| "Unknown".to_string());
        let image = reader.decode().map_err(|e| {
            log::warn!("Could not decode image {:?}: {}", path, e);
            AppError::Resource(format!("could not decode {}: {}", path.display(), e))
        })?;
        let (width, height) = image.dimensions();
        log::debug!("Dimensions for {:?}: {}x{} ({})", path, width, height, format);

        let mut metadata = ImageMetadata {
            file_path: path.to_string_lossy().to_string(),
            width,
            height,
            format,
            color_mode: format!("{:?}", image.color()),
            tags: BTreeMap::new(),
            gps_latitude: None,
            gps_longitude: None,
            place: None,
        };

        let mut buf_reader = BufReader::new(File::open(path)?);
        match Reader::new().read_from_container(&mut buf_reader) {
            Ok(exif) => {
                log::trace!("EXIF data found for {:?}", path);
                let (tags, latitude, longitude) = read_tag_block(&exif);
                metadata.tags = tags;
                metadata.gps_latitude = Some(latitude);
                metadata.gps_longitude = Some(longitude);
            }
            Err(exif::Error::NotFound(_)) => {
                log::debug!("No EXIF data found for {:?}", path);
            }
            Err(e) => {
                log::warn!("Ignoring unreadable EXIF block in {:?}: {}", path, e);
            }
        }

        log::info!("Decoded {} tags from {:?}", metadata.tags.len(), path);
        Ok(metadata)
    }
}

fn read_tag_block(exif: &Exif) -> (BTreeMap<String, TagValue>, GeoField, GeoField) {
    let mut tags = BTreeMap::new();
    for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
        if field.tag == XP_KEYWORDS {
            if let Value::Byte(bytes) = &field.value {
                tags.insert("XPKeywords".to_string(), TagValue::Text(utf16le_text(bytes)));
            }
            continue;
        }
        if let Some(value) = tag_value(field) {
            log::trace!("Tag {}: {}", field.tag, value);
            tags.insert(field.tag.to_string(), value);
        }
    }

    let (latitude, longitude) = read_position(exif);
    (tags, latitude, longitude)
}

fn read_position(exif: &Exif) -> (GeoField, GeoField) {
    let has_gps_group = exif.fields().any(|f| f.tag.context() == Context::Gps);
    if !has_gps_group {
        return (GeoField::NotAvailable, GeoField::NotAvailable);
    }

    let value = |tag: Tag| exif.get_field(tag, In::PRIMARY).map(|f| &f.value);
    match decode_position(
        value(Tag::GPSLatitude),
        value(Tag::GPSLatitudeRef),
        value(Tag::GPSLongitude),
        value(Tag::GPSLongitudeRef),
    ) {
        Ok(coord) => {
            log::debug!("GPS position: {}, {}", coord.latitude, coord.longitude);
            (GeoField::Degrees(coord.latitude), GeoField::Degrees(coord.longitude))
        }
        Err(e) => {
            log::warn!("Error processing GPS data: {}", e);
            (GeoField::Invalid, GeoField::Invalid)
        }
    }
}

pub(crate) fn decode_position(
    latitude: Option<&Value>,
    latitude_ref: Option<&Value>,
    longitude: Option<&Value>,
    longitude_ref: Option<&Value>,
) -> Result<GeoCoordinate, AppError> {
    let missing = |what: &str| AppError::Decode(format!("missing {}", what));

    let latitude = dms_to_decimal(latitude.ok_or_else(|| missing("latitude"))?)?;
    let longitude = dms_to_decimal(longitude.ok_or_else(|| missing("longitude"))?)?;

    let latitude = match hemisphere(latitude_ref.ok_or_else(|| missing("latitude reference"))?)? {
        'N' => latitude,
        'S' => -latitude,
        other => return Err(AppError::Decode(format!("bad latitude reference {:?}", other))),
    };
    let longitude = match hemisphere(longitude_ref.ok_or_else(|| missing("longitude reference"))?)? {
        'E' => longitude,
        'W' => -longitude,
        other => return Err(AppError::Decode(format!("bad longitude reference {:?}", other))),
    };

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::Decode(format!("position out of range: {}, {}", latitude, longitude)));
    }
    Ok(GeoCoordinate { latitude, longitude })
}

/// Degrees, minutes, seconds as rationals to decimal degrees.
pub(crate) fn dms_to_decimal(value: &Value) -> Result<f64, AppError> {
    let parts: Vec<f64> = match value {
        Value::Rational(rationals) => rationals
            .iter()
            .map(|r| ratio(r.num as f64, r.denom as f64))
            .collect::<Result<_, _>>()?,
        Value::SRational(rationals) => rationals
            .iter()
            .map(|r| ratio(r.num as f64, r.denom as f64))
            .collect::<Result<_, _>>()?,
        _ => return Err(AppError::Decode("expected rational degrees/minutes/seconds".into())),
    };
    if parts.len() < 3 {
        return Err(AppError::Decode(format!("expected 3 components, found {}", parts.len())));
    }
    Ok(parts[0] + parts[1] / 60.0 + parts[2] / 3600.0)
}

fn ratio(num: f64, denom: f64) -> Result<f64, AppError> {
    if denom == 0.0 {
        return Err(AppError::Decode("zero denominator".into()));
    }
    Ok(num / denom)
}

fn hemisphere(value: &Value) -> Result<char, AppError> {
    match value {
        Value::Ascii(strings) => strings
            .first()
            .and_then(|s| s.iter().find(|b| !b.is_ascii_whitespace()))
            .map(|b| b.to_ascii_uppercase() as char)
            .ok_or_else(|| AppError::Decode("empty hemisphere reference".into())),
        _ => Err(AppError::Decode("hemisphere reference is not text".into())),
    }
}

fn tag_value(field: &Field) -> Option<TagValue> {
    fn collapse(mut items: Vec<TagValue>) -> Option<TagValue> {
        match items.len() {
            0 => None,
            1 => items.pop(),
            _ => Some(TagValue::List(items)),
        }
    }
    let integers = |it: &mut dyn Iterator<Item = i64>| collapse(it.map(TagValue::Integer).collect());
    let numbers = |it: &mut dyn Iterator<Item = f64>| collapse(it.map(TagValue::Number).collect());

    match &field.value {
        Value::Ascii(strings) => {
            let text: Vec<String> = strings
                .iter()
                .map(|s| String::from_utf8_lossy(s).trim_end_matches('\0').to_string())
                .collect();
            Some(TagValue::Text(text.join(", ")))
        }
        Value::Byte(v) => integers(&mut v.iter().map(|&x| x as i64)),
        Value::Short(v) => integers(&mut v.iter().map(|&x| x as i64)),
        Value::Long(v) => integers(&mut v.iter().map(|&x| x as i64)),
        Value::SByte(v) => integers(&mut v.iter().map(|&x| x as i64)),
        Value::SShort(v) => integers(&mut v.iter().map(|&x| x as i64)),
        Value::SLong(v) => integers(&mut v.iter().map(|&x| x as i64)),
        Value::Rational(v) => numbers(&mut v.iter().map(|r| r.to_f64())),
        Value::SRational(v) => numbers(&mut v.iter().map(|r| r.to_f64())),
        Value::Float(v) => numbers(&mut v.iter().map(|&x| x as f64)),
        Value::Double(v) => numbers(&mut v.iter().copied()),
        Value::Undefined(..) => Some(TagValue::Text(field.display_value().to_string())),
        _ => None,
    }
}

fn utf16le_text(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units).trim_end_matches('\0').to_string()
}

/// Tag-block builders shared by the decoder and orchestrator tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use exif::experimental::Writer;
    use exif::Rational;
    use std::io::Cursor;

    pub fn rationals(parts: &[(u32, u32)]) -> Value {
        Value::Rational(parts.iter().map(|&(num, denom)| Rational { num, denom }).collect())
    }

    pub fn ascii(text: &str) -> Value {
        Value::Ascii(vec![text.as_bytes().to_vec()])
    }

    pub fn field(tag: Tag, value: Value) -> Field {
        Field { tag, ifd_num: In::PRIMARY, value }
    }

    /// Big-endian TIFF bytes holding `fields`.
    pub fn tiff_block(fields: &[Field]) -> Vec<u8> {
        let mut writer = Writer::new();
        for field in fields {
            writer.push_field(field);
        }
        let mut buf = Cursor::new(Vec::new());
        writer.write(&mut buf, false).unwrap();
        buf.into_inner()
    }

    pub fn exif_from_fields(fields: &[Field]) -> Exif {
        Reader::new().read_raw(tiff_block(fields)).unwrap()
    }

    /// Writes a small JPEG at `path` with `fields` in an APP1 segment after SOI.
    pub fn write_tagged_jpeg(path: &Path, fields: &[Field]) {
        image::RgbImage::new(4, 3).save(path).expect("write jpeg");
        let jpeg = std::fs::read(path).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let tiff = tiff_block(fields);
        let segment_len = u16::try_from(2 + 6 + tiff.len()).unwrap();
        let mut tagged = Vec::with_capacity(jpeg.len() + tiff.len() + 10);
        tagged.extend_from_slice(&jpeg[..2]);
        tagged.extend_from_slice(&[0xFF, 0xE1]);
        tagged.extend_from_slice(&segment_len.to_be_bytes());
        tagged.extend_from_slice(b"Exif\0\0");
        tagged.extend_from_slice(&tiff);
        tagged.extend_from_slice(&jpeg[2..]);
        std::fs::write(path, tagged).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::config::test_config;

    #[test]
    fn dms_conversion_is_exact() {
        let value = rationals(&[(10, 1), (30, 1), (0, 1)]);
        assert_eq!(dms_to_decimal(&value).unwrap(), 10.5);

        let value = rationals(&[(35, 1), (5400, 100), (36, 1)]);
        assert_eq!(dms_to_decimal(&value).unwrap(), 35.0 + 54.0 / 60.0 + 36.0 / 3600.0);
    }

    #[test]
    fn hemisphere_markers_set_the_sign() {
        let dms = rationals(&[(10, 1), (30, 1), (0, 1)]);

        let north_east =
            decode_position(Some(&dms), Some(&ascii("N")), Some(&dms), Some(&ascii("E"))).unwrap();
        assert_eq!(north_east, GeoCoordinate { latitude: 10.5, longitude: 10.5 });

        let south_west =
            decode_position(Some(&dms), Some(&ascii("S")), Some(&dms), Some(&ascii("W"))).unwrap();
        assert_eq!(south_west, GeoCoordinate { latitude: -10.5, longitude: -10.5 });
    }

    #[test]
    fn malformed_components_are_rejected() {
        let dms = rationals(&[(10, 1), (30, 1), (0, 1)]);
        let zero_denominator = rationals(&[(10, 1), (30, 1), (1, 0)]);
        let short = rationals(&[(10, 1), (30, 1)]);
        let text_seconds = ascii("ten");

        for bad in [&zero_denominator, &short, &text_seconds] {
            let result = decode_position(Some(bad), Some(&ascii("N")), Some(&dms), Some(&ascii("E")));
            assert!(matches!(result, Err(AppError::Decode(_))));
        }
        let no_ref = decode_position(Some(&dms), None, Some(&dms), Some(&ascii("E")));
        assert!(matches!(no_ref, Err(AppError::Decode(_))));
        let odd_ref = decode_position(Some(&dms), Some(&ascii("Q")), Some(&dms), Some(&ascii("E")));
        assert!(matches!(odd_ref, Err(AppError::Decode(_))));
    }

    #[test]
    fn out_of_range_latitude_is_invalid() {
        let dms = rationals(&[(95, 1), (0, 1), (0, 1)]);
        let result = decode_position(Some(&dms), Some(&ascii("N")), Some(&dms), Some(&ascii("E")));
        assert!(result.is_err());
    }

    #[test]
    fn tag_block_without_gps_reports_not_available() {
        let artist = field(Tag::Artist, ascii("Jane Doe"));
        let exif = exif_from_fields(&[artist]);

        let (tags, latitude, longitude) = read_tag_block(&exif);
        assert_eq!(tags.get("Artist"), Some(&TagValue::Text("Jane Doe".into())));
        assert_eq!(latitude, GeoField::NotAvailable);
        assert_eq!(longitude, GeoField::NotAvailable);
    }

    #[test]
    fn tag_block_with_gps_decodes_position() {
        let fields = [
            field(Tag::Artist, ascii("Jane Doe")),
            field(Tag::GPSLatitudeRef, ascii("N")),
            field(Tag::GPSLatitude, rationals(&[(35, 1), (54, 1), (0, 1)])),
            field(Tag::GPSLongitudeRef, ascii("W")),
            field(Tag::GPSLongitude, rationals(&[(14, 1), (30, 1), (0, 1)])),
        ];
        let exif = exif_from_fields(&fields);

        let (_, latitude, longitude) = read_tag_block(&exif);
        assert_eq!(latitude, GeoField::Degrees(35.0 + 54.0 / 60.0));
        assert_eq!(longitude, GeoField::Degrees(-14.5));
    }

    #[test]
    fn malformed_gps_group_keeps_other_tags() {
        let fields = [
            field(Tag::Artist, ascii("Jane Doe")),
            field(Tag::GPSLatitudeRef, ascii("N")),
            field(Tag::GPSLatitude, ascii("thirty five")),
            field(Tag::GPSLongitudeRef, ascii("E")),
            field(Tag::GPSLongitude, rationals(&[(14, 1), (30, 1), (0, 1)])),
        ];
        let exif = exif_from_fields(&fields);

        let (tags, latitude, longitude) = read_tag_block(&exif);
        assert_eq!(latitude, GeoField::Invalid);
        assert_eq!(longitude, GeoField::Invalid);
        assert_eq!(tags.get("Artist"), Some(&TagValue::Text("Jane Doe".into())));
    }

    #[test]
    fn xp_keywords_are_decoded_from_utf16() {
        let bytes: Vec<u8> = "protest,valletta\0"
            .encode_utf16()
            .flat_map(|unit| unit.to_le_bytes())
            .collect();
        assert_eq!(utf16le_text(&bytes), "protest,valletta");
    }

    #[test]
    fn decode_reads_basic_attributes_without_tag_block() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("plain.png");
        image::RgbImage::new(4, 3).save(&path).expect("write png");

        let metadata = TagDecoder::new(&test_config()).decode(&path).unwrap();
        assert_eq!((metadata.width, metadata.height), (4, 3));
        assert_eq!(metadata.format, "Png");
        assert_eq!(metadata.color_mode, "Rgb8");
        assert!(metadata.tags.is_empty());
        assert_eq!(metadata.gps_latitude, None);
        assert_eq!(metadata.gps_longitude, None);
        assert!(metadata.display_entries().iter().all(|(k, _)| !k.starts_with("GPS")));
    }

    #[test]
    fn decode_reads_tag_block_from_jpeg() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("tagged.jpg");
        write_tagged_jpeg(
            &path,
            &[
                field(Tag::Artist, ascii("Jane Doe")),
                field(Tag::GPSLatitudeRef, ascii("N")),
                field(Tag::GPSLatitude, rationals(&[(35, 1), (54, 1), (0, 1)])),
                field(Tag::GPSLongitudeRef, ascii("E")),
                field(Tag::GPSLongitude, rationals(&[(14, 1), (30, 1), (0, 1)])),
            ],
        );

        let metadata = TagDecoder::new(&test_config()).decode(&path).unwrap();
        assert_eq!(metadata.format, "Jpeg");
        assert_eq!(metadata.text_tag("Artist"), "Jane Doe");
        assert_eq!(metadata.gps_latitude, Some(GeoField::Degrees(35.0 + 54.0 / 60.0)));
        assert_eq!(metadata.gps_longitude, Some(GeoField::Degrees(14.5)));
    }

    #[test]
    fn decode_rejects_unreadable_resources() {
        let decoder = TagDecoder::new(&test_config());
        let temp_dir = tempfile::tempdir().expect("temp dir");

        let missing = decoder.decode(&temp_dir.path().join("missing.jpg"));
        assert!(matches!(missing, Err(AppError::Resource(_))));

        let text_path = temp_dir.path().join("notes.txt");
        std::fs::write(&text_path, "not an image").unwrap();
        assert!(matches!(decoder.decode(&text_path), Err(AppError::Resource(_))));

        let corrupt_path = temp_dir.path().join("corrupt.jpg");
        std::fs::write(&corrupt_path, "not an image").unwrap();
        assert!(matches!(decoder.decode(&corrupt_path), Err(AppError::Resource(_))));
    }
}
