use serde::{Deserialize, Serialize};

use crate::image::Channel;

pub const HISTOGRAM_BINS: usize = 256;
pub const HU_MOMENT_COUNT: usize = 7;
pub const EDGE_HISTOGRAM_BINS: usize = 10;
pub const FINGERPRINT_SCHEMA_VERSION: u32 = 1;

/// GLCM angles in radians, in the order every per-angle vector uses.
pub const GLCM_ANGLES: [f64; 4] = [
    0.0,
    std::f64::consts::FRAC_PI_4,
    std::f64::consts::FRAC_PI_2,
    3.0 * std::f64::consts::FRAC_PI_4,
];

pub const GLCM_PROPERTIES: [&str; 5] = [
    "contrast",
    "dissimilarity",
    "homogeneity",
    "energy",
    "correlation",
];

pub type ShapeDescriptor = [f64; HU_MOMENT_COUNT];

/// Per-channel 256-bin intensity counts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorHistogram {
    pub blue: Vec<u64>,
    pub green: Vec<u64>,
    pub red: Vec<u64>,
}

impl ColorHistogram {
    pub fn zeroed() -> Self {
        Self {
            blue: vec![0; HISTOGRAM_BINS],
            green: vec![0; HISTOGRAM_BINS],
            red: vec![0; HISTOGRAM_BINS],
        }
    }

    pub fn channel(&self, channel: Channel) -> &[u64] {
        match channel {
            Channel::Blue => &self.blue,
            Channel::Green => &self.green,
            Channel::Red => &self.red,
        }
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut Vec<u64> {
        match channel {
            Channel::Blue => &mut self.blue,
            Channel::Green => &mut self.green,
            Channel::Red => &mut self.red,
        }
    }
}

impl Default for ColorHistogram {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Integer RGB triple; serializes as `[r, g, b]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RgbColor(pub [u8; 3]);

impl RgbColor {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }
}

/// Haralick properties, one value per angle of [`GLCM_ANGLES`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GlcmFeatures {
    pub contrast: Vec<f64>,
    pub dissimilarity: Vec<f64>,
    pub homogeneity: Vec<f64>,
    pub energy: Vec<f64>,
    pub correlation: Vec<f64>,
}

impl GlcmFeatures {
    pub fn property(&self, name: &str) -> Option<&[f64]> {
        match name {
            "contrast" => Some(&self.contrast),
            "dissimilarity" => Some(&self.dissimilarity),
            "homogeneity" => Some(&self.homogeneity),
            "energy" => Some(&self.energy),
            "correlation" => Some(&self.correlation),
            _ => None,
        }
    }

    pub fn push_angle(&mut self, values: [f64; 5]) {
        self.contrast.push(values[0]);
        self.dissimilarity.push(values[1]);
        self.homogeneity.push(values[2]);
        self.energy.push(values[3]);
        self.correlation.push(values[4]);
    }
}

/// Aggregate retrieval record for one image.
///
/// Every field carries either a computed descriptor or that descriptor's
/// degraded default; see the aggregator for the fallback rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fingerprint {
    pub schema_version: u32,
    pub histogram: ColorHistogram,
    pub dominant_colors: Vec<RgbColor>,
    pub texture_descriptor: Vec<f64>,
    pub glcm_features: Option<GlcmFeatures>,
    pub shape_descriptor: ShapeDescriptor,
    pub edge_histogram: Option<Vec<u64>>,
    pub edge_density: Option<f64>,
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self {
            schema_version: FINGERPRINT_SCHEMA_VERSION,
            histogram: ColorHistogram::zeroed(),
            dominant_colors: Vec::new(),
            texture_descriptor: Vec::new(),
            glcm_features: None,
            shape_descriptor: [0.0; HU_MOMENT_COUNT],
            edge_histogram: None,
            edge_density: None,
        }
    }
}

impl Fingerprint {
    /// Flattens the record into one numeric vector usable as a query.
    ///
    /// Layout: blue, green, red histograms; dominant colors as r, g, b;
    /// texture responses; GLCM property-major; Hu moments; edge histogram
    /// or edge density. Absent parts contribute nothing, so only vectors
    /// produced under the same configuration are comparable.
    pub fn feature_vector(&self) -> Vec<f64> {
        let mut vector = Vec::with_capacity(
            HISTOGRAM_BINS * 3
                + self.dominant_colors.len() * 3
                + self.texture_descriptor.len()
                + HU_MOMENT_COUNT
                + 32,
        );
        for channel in Channel::ALL {
            vector.extend(self.histogram.channel(channel).iter().map(|&c| c as f64));
        }
        for color in &self.dominant_colors {
            vector.extend(color.0.iter().map(|&c| c as f64));
        }
        vector.extend_from_slice(&self.texture_descriptor);
        if let Some(glcm) = &self.glcm_features {
            for name in GLCM_PROPERTIES {
                if let Some(values) = glcm.property(name) {
                    vector.extend_from_slice(values);
                }
            }
        }
        vector.extend_from_slice(&self.shape_descriptor);
        if let Some(bins) = &self.edge_histogram {
            vector.extend(bins.iter().map(|&c| c as f64));
        }
        if let Some(density) = self.edge_density {
            vector.push(density);
        }
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_serializes_with_canonical_keys() {
        let mut fingerprint = Fingerprint::default();
        fingerprint.dominant_colors.push(RgbColor::new(1, 2, 3));
        fingerprint.edge_histogram = Some(vec![0; EDGE_HISTOGRAM_BINS]);
        let value = serde_json::to_value(&fingerprint).unwrap();
        assert_eq!(value["schemaVersion"], 1);
        assert_eq!(value["dominantColors"][0], serde_json::json!([1, 2, 3]));
        assert_eq!(value["histogram"]["blue"].as_array().unwrap().len(), 256);
        assert!(value["glcmFeatures"].is_null());
        assert!(value["edgeDensity"].is_null());
        assert_eq!(value["shapeDescriptor"].as_array().unwrap().len(), 7);
    }

    #[test]
    fn feature_vector_follows_documented_layout() {
        let mut fingerprint = Fingerprint::default();
        fingerprint.histogram.red[255] = 4;
        fingerprint.dominant_colors = vec![RgbColor::new(9, 8, 7)];
        fingerprint.texture_descriptor = vec![0.5, 0.25];
        let mut glcm = GlcmFeatures::default();
        glcm.push_angle([1.0, 2.0, 3.0, 4.0, 5.0]);
        fingerprint.glcm_features = Some(glcm);
        fingerprint.shape_descriptor[0] = 0.125;
        fingerprint.edge_density = Some(0.75);

        let vector = fingerprint.feature_vector();
        assert_eq!(vector.len(), 768 + 3 + 2 + 5 + 7 + 1);
        assert_eq!(vector[767], 4.0);
        assert_eq!(&vector[768..771], &[9.0, 8.0, 7.0]);
        assert_eq!(&vector[771..773], &[0.5, 0.25]);
        assert_eq!(&vector[773..778], &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(vector[778], 0.125);
        assert_eq!(*vector.last().unwrap(), 0.75);
    }
}
