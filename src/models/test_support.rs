use crate::models::{ImageClassifier, Recognition};
use crate::utils::error::ClassifyError;
use crate::Result;
use image::DynamicImage;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// 返回固定结果的假分类器，closed后和真实实现一样返回ClassifierClosed
pub struct FakeClassifier {
    results: Vec<Recognition>,
    closed: AtomicBool,
    calls: AtomicUsize,
}

impl FakeClassifier {
    pub fn with_results(results: Vec<Recognition>) -> Self {
        Self {
            results,
            closed: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageClassifier for FakeClassifier {
    fn recognize_image(&self, _image: &DynamicImage) -> Result<Vec<Recognition>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.is_closed() {
            return Err(ClassifyError::ClassifierClosed);
        }
        Ok(self.results.clone())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
