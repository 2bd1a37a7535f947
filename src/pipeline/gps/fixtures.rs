//! In-memory TIFF/EXIF images for tests, written with kamadak-exif's
//! TIFF writer so the reader side is exercised for real.

use std::io::Cursor;

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};

#[derive(Default)]
pub(crate) struct ExifFixture {
    fields: Vec<Field>,
}

impl ExifFixture {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn latitude(self, dms: [f64; 3], reference: &str) -> Self {
        self.latitude_without_ref(dms)
            .field(ascii(Tag::GPSLatitudeRef, reference))
    }

    pub(crate) fn longitude(self, dms: [f64; 3], reference: &str) -> Self {
        self.longitude_without_ref(dms)
            .field(ascii(Tag::GPSLongitudeRef, reference))
    }

    pub(crate) fn latitude_without_ref(self, dms: [f64; 3]) -> Self {
        self.field(rationals(Tag::GPSLatitude, dms))
    }

    pub(crate) fn longitude_without_ref(self, dms: [f64; 3]) -> Self {
        self.field(rationals(Tag::GPSLongitude, dms))
    }

    pub(crate) fn captured_at(self, exif_datetime: &str) -> Self {
        self.field(ascii(Tag::DateTimeOriginal, exif_datetime))
    }

    pub(crate) fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        for field in &self.fields {
            writer.push_field(field);
        }
        let mut buf = Cursor::new(Vec::new());
        writer.write(&mut buf, true).unwrap();
        buf.into_inner()
    }
}

fn ascii(tag: Tag, text: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    }
}

fn rationals(tag: Tag, dms: [f64; 3]) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Rational(
            dms.iter()
                .map(|&v| Rational {
                    num: (v * 10_000.0).round() as u32,
                    denom: 10_000,
                })
                .collect(),
        ),
    }
}
