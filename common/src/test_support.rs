use crate::fields::{FieldSetter, FormField};
use crate::notify::{Notification, NotificationKind, Notifier};
use image::{DynamicImage, ImageFormat, Luma};
use std::io::Cursor;
use std::sync::Mutex;

/// PNG bytes of a QR code carrying `payload`
pub fn qr_png(payload: &str) -> Vec<u8> {
    let code = qrcode::QrCode::new(payload.as_bytes()).unwrap();
    let img = code.render::<Luma<u8>>().build();
    encode_png(DynamicImage::ImageLuma8(img))
}

/// PNG bytes of a plain white image
pub fn blank_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::GrayImage::from_pixel(width, height, Luma([255]));
    encode_png(DynamicImage::ImageLuma8(img))
}

fn encode_png(img: DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
    buf
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn count(&self, kind: NotificationKind) -> usize {
        self.seen.lock().unwrap().iter().filter(|n| n.kind == kind).count()
    }

    pub fn total(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

/// Records every write, and every batch separately
#[derive(Default)]
pub struct RecordingFields {
    pub writes: Mutex<Vec<(FormField, String)>>,
    pub batches: Mutex<Vec<Vec<(FormField, String)>>>,
}

impl RecordingFields {
    pub fn value(&self, field: FormField) -> Option<String> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.clone())
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

impl FieldSetter for RecordingFields {
    fn set_value(&self, field: FormField, value: &str) {
        self.writes.lock().unwrap().push((field, value.to_string()));
    }

    fn set_values(&self, values: &[(FormField, String)]) {
        self.batches.lock().unwrap().push(values.to_vec());
        self.writes.lock().unwrap().extend(values.iter().cloned());
    }
}
