use crate::Result;
use image::DynamicImage;
use std::path::Path;

pub struct ImageLoader;

impl ImageLoader {
    /// 从文件路径加载图像
    pub fn from_path(path: &Path) -> Result<DynamicImage> {
        let image = image::open(path)?;
        Ok(image)
    }

    /// 从内存字节加载图像
    pub fn from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        let image = image::load_from_memory(bytes)?;
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_reports_missing_file() {
        let result = ImageLoader::from_path(Path::new("does-not-exist.png"));
        assert!(result.is_err());
    }

    #[test]
    fn from_bytes_rejects_garbage() {
        let result = ImageLoader::from_bytes(&[0, 1, 2, 3]);
        assert!(result.is_err());
    }
}
