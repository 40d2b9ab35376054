//! Local OCR provider backed by `pure-onnx-ocr`.

use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use tracing::{debug, info};

use super::{ImageRegion, OcrCost, OcrProvider};
use crate::error::OcrError;
use crate::models::config::OcrConfig;
use crate::models::document::{standardise_text, DocumentLine, DocumentLineWord};

/// Pixel height of one reading-order row.
const ROW_HEIGHT: f32 = 20.0;

/// OCR provider running detection and recognition models in-process.
pub struct LocalOcrProvider {
    engine: Mutex<pure_onnx_ocr::engine::OcrEngine>,
    config: OcrConfig,
}

impl LocalOcrProvider {
    /// Load the detection, recognition and dictionary files from a directory.
    pub fn from_dir(model_dir: &Path, config: OcrConfig) -> Result<Self, OcrError> {
        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&model_dir.join("det.onnx"))
            .rec_model_path(&model_dir.join("latin_rec.onnx"))
            .dictionary_path(&model_dir.join("latin_dict.txt"))
            .build()
            .map_err(|e| OcrError::ModelsUnavailable(format!("{}: {}", model_dir.display(), e)))?;

        info!("Loaded local OCR models from {}", model_dir.display());

        Ok(Self {
            engine: Mutex::new(engine),
            config,
        })
    }
}

impl OcrProvider for LocalOcrProvider {
    fn name(&self) -> &str {
        "local"
    }

    fn cost(&self) -> OcrCost {
        OcrCost::Local
    }

    fn recognise(&self, region: &ImageRegion) -> Result<Vec<DocumentLine>, OcrError> {
        let start = Instant::now();
        let image = region.decode()?;

        let results = {
            let engine = self
                .engine
                .lock()
                .map_err(|_| OcrError::Engine("engine lock poisoned".to_string()))?;
            engine
                .run_from_image(&image)
                .map_err(|e| OcrError::Engine(e.to_string()))?
        };

        let boxes: Vec<TextBox> = results
            .iter()
            .map(|r| TextBox {
                text: r.text.clone(),
                confidence: r.confidence * 100.0,
                rect: polygon_rect(&r.bounding_box),
            })
            .collect();

        let lines = rows_to_lines(boxes, region.page_number, &self.config);
        debug!(
            "OCR of {}: {} line(s) in {}ms",
            region.cache_key(),
            lines.len(),
            start.elapsed().as_millis()
        );
        Ok(lines)
    }
}

/// One recognised text region.
#[derive(Debug, Clone)]
struct TextBox {
    text: String,
    /// 0 - 100.
    confidence: f32,
    /// left, top, right, bottom
    rect: [f32; 4],
}

/// Axis-aligned rectangle around the first four polygon points.
fn polygon_rect(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 4] {
    let mut rect = [f32::MAX, f32::MAX, f32::MIN, f32::MIN];
    for coord in polygon.exterior().coords().take(4) {
        rect[0] = rect[0].min(coord.x as f32);
        rect[1] = rect[1].min(coord.y as f32);
        rect[2] = rect[2].max(coord.x as f32);
        rect[3] = rect[3].max(coord.y as f32);
    }
    if rect[0] > rect[2] {
        return [0.0; 4];
    }
    rect
}

/// Group text boxes into reading-order rows, one line per row.
fn rows_to_lines(mut boxes: Vec<TextBox>, page_number: u32, config: &OcrConfig) -> Vec<DocumentLine> {
    boxes.sort_by(|a, b| {
        let row_a = (a.rect[1] / ROW_HEIGHT) as i32;
        let row_b = (b.rect[1] / ROW_HEIGHT) as i32;
        row_a
            .cmp(&row_b)
            .then(a.rect[0].partial_cmp(&b.rect[0]).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<DocumentLine> = Vec::new();
    let mut current_row: Option<i32> = None;
    let mut words: Vec<DocumentLineWord> = Vec::new();

    for text_box in boxes {
        let row = (text_box.rect[1] / ROW_HEIGHT) as i32;
        if current_row.is_some_and(|r| r != row) && !words.is_empty() {
            lines.push(DocumentLine::from_words(std::mem::take(&mut words), lines.len(), page_number));
        }
        current_row = Some(row);

        if text_box.confidence < config.min_word_confidence {
            continue;
        }
        let text = if config.keep_unk {
            text_box.text
        } else {
            text_box.text.replace("[UNK]", " ")
        };
        let [left, top, right, bottom] = text_box.rect;
        words.extend(standardise_text(&text).split_whitespace().map(|token| {
            DocumentLineWord::new(token)
                .with_confidence(text_box.confidence)
                .with_coordinates(left, top, right, bottom)
        }));
    }
    if !words.is_empty() {
        lines.push(DocumentLine::from_words(words, lines.len(), page_number));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_box(text: &str, confidence: f32, x: f32, y: f32) -> TextBox {
        TextBox {
            text: text.to_string(),
            confidence,
            rect: [x, y, x + 50.0, y + 12.0],
        }
    }

    #[test]
    fn test_rows_in_reading_order() {
        let boxes = vec![
            text_box("Holder", 90.0, 120.0, 45.0),
            text_box("Licence", 92.0, 10.0, 42.0),
            text_box("Serial No 1/2/3", 88.0, 10.0, 5.0),
        ];
        let lines = rows_to_lines(boxes, 2, &OcrConfig::default());
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["Serial No 1/2/3", "Licence Holder"]);
        assert_eq!(lines[1].line_number, 1);
        assert_eq!(lines[1].page_number, 2);
        assert_eq!(lines[1].ocr_confidence(), Some(91.0));
    }

    #[test]
    fn test_low_confidence_words_are_dropped() {
        let config = OcrConfig {
            min_word_confidence: 50.0,
            ..OcrConfig::default()
        };
        let boxes = vec![text_box("noise", 12.0, 0.0, 0.0), text_box("Licence", 95.0, 60.0, 0.0)];
        let lines = rows_to_lines(boxes, 1, &config);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Licence");
    }

    #[test]
    fn test_unknown_tokens() {
        let boxes = || vec![text_box("Wa[UNK]ter", 80.0, 0.0, 0.0)];
        assert_eq!(rows_to_lines(boxes(), 1, &OcrConfig::default())[0].text, "Wa ter");

        let keep = OcrConfig {
            keep_unk: true,
            ..OcrConfig::default()
        };
        assert_eq!(rows_to_lines(boxes(), 1, &keep)[0].text, "Wa[UNK]ter");
    }

    #[test]
    fn test_missing_models_fail_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let result = LocalOcrProvider::from_dir(dir.path(), OcrConfig::default());
        assert!(matches!(result, Err(OcrError::ModelsUnavailable(_))));
    }
}
