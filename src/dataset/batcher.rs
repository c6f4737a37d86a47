//! Batch boundary between an external data source and the training loops.
//!
//! The crate does not own data loading or augmentation; callers hand over
//! pre-processed samples and this module turns them into device tensors.

use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// A single sample ready for batching: flattened CHW float image plus label.
#[derive(Clone, Debug)]
pub struct ImageItem {
    /// Image data as a flattened CHW float array [3 * H * W]
    pub image: Vec<f32>,
    /// Integer class label
    pub label: usize,
}

/// One batch of images and integer targets.
#[derive(Clone, Debug)]
pub struct ImageBatch<B: Backend> {
    /// Images of shape [batch, 3, H, W]
    pub images: Tensor<B, 4>,
    /// Labels of shape [batch]
    pub targets: Tensor<B, 1, Int>,
}

/// Batcher collating `ImageItem`s into `ImageBatch`es.
#[derive(Clone, Debug)]
pub struct ClassifierBatcher {
    image_size: usize,
}

impl ClassifierBatcher {
    pub fn new(image_size: usize) -> Self {
        Self { image_size }
    }
}

impl<B: Backend> Batcher<B, ImageItem, ImageBatch<B>> for ClassifierBatcher {
    fn batch(&self, items: Vec<ImageItem>, device: &B::Device) -> ImageBatch<B> {
        let batch_size = items.len();
        let (height, width) = (self.image_size, self.image_size);

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.clone()).collect();
        let images = Tensor::<B, 4>::from_data(
            TensorData::new(images_data, [batch_size, 3, height, width]),
            device,
        );

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets =
            Tensor::<B, 1, Int>::from_data(TensorData::new(targets_data, [batch_size]), device);

        ImageBatch { images, targets }
    }
}

/// Builds the finite batch sequence for one epoch, optionally shuffled with a
/// seeded generator. The returned sequence is exhausted once per epoch;
/// calling again restarts it.
pub fn epoch_batches<B: Backend>(
    items: &[ImageItem],
    batch_size: usize,
    batcher: &ClassifierBatcher,
    device: &B::Device,
    shuffle: Option<&mut ChaCha8Rng>,
) -> Vec<ImageBatch<B>> {
    let mut indices: Vec<usize> = (0..items.len()).collect();
    if let Some(rng) = shuffle {
        indices.shuffle(rng);
    }

    indices
        .chunks(batch_size)
        .map(|chunk| {
            let batch_items: Vec<ImageItem> = chunk.iter().map(|&i| items[i].clone()).collect();
            batcher.batch(batch_items, device)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use rand::SeedableRng;

    type TestBackend = NdArray;

    fn items(count: usize, image_size: usize) -> Vec<ImageItem> {
        (0..count)
            .map(|i| ImageItem {
                image: vec![0.5; 3 * image_size * image_size],
                label: i % 2,
            })
            .collect()
    }

    #[test]
    fn test_batch_shapes() {
        let device = Default::default();
        let batcher = ClassifierBatcher::new(8);

        let batch: ImageBatch<TestBackend> = batcher.batch(items(4, 8), &device);
        assert_eq!(batch.images.dims(), [4, 3, 8, 8]);
        assert_eq!(batch.targets.dims(), [4]);
    }

    #[test]
    fn test_epoch_batches_covers_all_samples() {
        let device = Default::default();
        let batcher = ClassifierBatcher::new(8);

        let batches: Vec<ImageBatch<TestBackend>> =
            epoch_batches(&items(10, 8), 4, &batcher, &device, None);

        // 10 samples at batch size 4: two full batches plus a partial one.
        assert_eq!(batches.len(), 3);
        let total: usize = batches.iter().map(|b| b.targets.dims()[0]).sum();
        assert_eq!(total, 10);
        assert_eq!(batches[2].targets.dims()[0], 2);
    }

    #[test]
    fn test_epoch_batches_shuffle_is_deterministic() {
        let device = Default::default();
        let batcher = ClassifierBatcher::new(8);
        let samples = items(8, 8);

        let mut rng_a = ChaCha8Rng::seed_from_u64(7);
        let mut rng_b = ChaCha8Rng::seed_from_u64(7);

        let a: Vec<ImageBatch<TestBackend>> =
            epoch_batches(&samples, 4, &batcher, &device, Some(&mut rng_a));
        let b: Vec<ImageBatch<TestBackend>> =
            epoch_batches(&samples, 4, &batcher, &device, Some(&mut rng_b));

        for (x, y) in a.iter().zip(b.iter()) {
            let x: Vec<i64> = x.targets.clone().into_data().to_vec().unwrap();
            let y: Vec<i64> = y.targets.clone().into_data().to_vec().unwrap();
            assert_eq!(x, y);
        }
    }
}
