use cbir_fast_types::{BgrImage, Channel, ColorHistogram, HISTOGRAM_BINS};
use tracing::warn;

use crate::error::{DescriptorError, DescriptorResult};
use crate::extractors::DescriptorExtractor;

const TAG: &str = "histogram";

/// 256-bin intensity histogram per color channel.
#[derive(Default)]
pub struct ColorHistogramExtractor;

impl ColorHistogramExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl DescriptorExtractor for ColorHistogramExtractor {
    type Output = ColorHistogram;

    fn name(&self) -> &'static str {
        TAG
    }

    /// Channels fail independently: a channel that cannot be counted is
    /// reported as all zeros and the other channels are kept.
    fn extract(&self, image: &BgrImage) -> DescriptorResult<ColorHistogram> {
        let mut histogram = ColorHistogram::zeroed();
        for channel in Channel::ALL {
            let plane = image.channel_plane(channel);
            match channel_histogram(&plane, channel) {
                Ok(counts) => *histogram.channel_mut(channel) = counts,
                Err(err) => warn!(
                    descriptor = TAG,
                    channel = %channel,
                    error = %err,
                    "channel histogram replaced by zeros"
                ),
            }
        }
        Ok(histogram)
    }
}

fn channel_histogram(plane: &[u8], channel: Channel) -> DescriptorResult<Vec<u64>> {
    if plane.is_empty() {
        return Err(DescriptorError::EmptyPlane {
            plane: channel.as_str(),
        });
    }
    let mut counts = vec![0u64; HISTOGRAM_BINS];
    for &value in plane {
        counts[value as usize] += 1;
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_each_channel_separately() {
        // One pure-blue pixel and one pure-red pixel (stored BGR).
        let image = BgrImage::from_owned(2, 1, vec![255, 0, 0, 0, 0, 255]).unwrap();
        let histogram = ColorHistogramExtractor::new().extract(&image).unwrap();
        assert_eq!(histogram.blue[255], 1);
        assert_eq!(histogram.blue[0], 1);
        assert_eq!(histogram.green[0], 2);
        assert_eq!(histogram.red[255], 1);
        for channel in Channel::ALL {
            assert_eq!(histogram.channel(channel).len(), HISTOGRAM_BINS);
            assert_eq!(histogram.channel(channel).iter().sum::<u64>(), 2);
        }
    }

    #[test]
    fn empty_plane_is_an_error() {
        assert!(matches!(
            channel_histogram(&[], Channel::Green),
            Err(DescriptorError::EmptyPlane { plane: "green" })
        ));
    }
}
