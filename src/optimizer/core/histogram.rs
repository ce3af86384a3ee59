use crate::optimizer::core::statistics_meta::{Guidepost, PartitionStats};
use crate::storage::RegionId;

/// Equal byte-depth guideposts over one region, fed in key order.
pub struct GuidepostBuilder {
    region_id: RegionId,
    byte_depth: u64,

    row_count: u64,
    byte_count: u64,
    bytes_since_guidepost: u64,
    guideposts: Vec<Guidepost>,
}

impl GuidepostBuilder {
    pub fn new(region_id: RegionId, byte_depth: u64) -> Self {
        GuidepostBuilder {
            region_id,
            byte_depth: byte_depth.max(1),
            row_count: 0,
            byte_count: 0,
            bytes_since_guidepost: 0,
            guideposts: vec![],
        }
    }

    pub fn append(&mut self, key: &[u8], value: &[u8]) {
        let size = (key.len() + value.len()) as u64;

        self.row_count += 1;
        self.byte_count += size;
        self.bytes_since_guidepost += size;

        if self.bytes_since_guidepost >= self.byte_depth {
            self.guideposts.push(Guidepost {
                partition_id: self.region_id,
                split_key: key.to_vec(),
                cumulative_byte_count: self.byte_count,
                cumulative_row_count: self.row_count,
            });
            self.bytes_since_guidepost = 0;
        }
    }

    pub fn build(self, last_update_timestamp: i64) -> PartitionStats {
        PartitionStats {
            partition_id: self.region_id,
            guideposts: self.guideposts,
            row_count: self.row_count,
            byte_count: self.byte_count,
            last_update_timestamp,
            byte_depth: self.byte_depth,
        }
    }
}
