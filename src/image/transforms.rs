use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;

/// 把拍摄图像缩放到模型输入尺寸。最近邻即可，滤波方式不影响语义。
pub fn resize_to_input(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    image.resize_exact(width, height, FilterType::Nearest)
}

/// DynamicImage转NHWC输入张量，逐像素做(value - mean) / std归一化
pub fn to_model_input(
    image: &DynamicImage,
    width: u32,
    height: u32,
    mean: f32,
    std: f32,
) -> Array4<f32> {
    let rgb = resize_to_input(image, width, height).to_rgb8();

    let mut input = Array4::<f32>::zeros((1, height as usize, width as usize, 3));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for channel in 0..3 {
            input[[0, y as usize, x as usize, channel]] =
                (pixel[channel] as f32 - mean) / std;
        }
    }

    input
}
