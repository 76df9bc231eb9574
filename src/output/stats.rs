//! Statistics for one collection run

use serde::Serialize;

/// Counters computed during finalization
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionStatistics {
    pub total_cells: usize,
    pub completed_cells: usize,
    /// Cells that exhausted their attempt budget
    pub failed_cells: usize,

    pub total_collected: usize,
    pub duplicates_removed: u64,
    pub filtered_outside_boundary: u64,
    /// Pages whose shape did not match the extractors
    pub structural_warnings: u64,

    pub enriched: u64,
    pub enrichment_failed: u64,
    pub enrichment_skipped: u64,

    pub search_seconds: f64,
    pub total_seconds: f64,
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CollectionStatistics) {
    println!("=== Collection Statistics ===\n");

    println!("Cells:");
    println!("  Total: {}", stats.total_cells);
    println!("  Completed: {}", stats.completed_cells);
    println!("  Permanently failed: {}", stats.failed_cells);
    println!();

    println!("Records:");
    println!("  Collected: {}", stats.total_collected);
    println!("  Duplicates removed: {}", stats.duplicates_removed);
    println!(
        "  Filtered (outside boundary): {}",
        stats.filtered_outside_boundary
    );
    if stats.structural_warnings > 0 {
        println!("  Structural warnings: {}", stats.structural_warnings);
    }
    println!();

    if stats.enriched + stats.enrichment_failed + stats.enrichment_skipped > 0 {
        println!("Enrichment:");
        println!("  Enriched: {}", stats.enriched);
        println!("  Failed: {}", stats.enrichment_failed);
        println!("  Skipped: {}", stats.enrichment_skipped);
        println!();
    }

    let cell_success_rate = if stats.total_cells > 0 {
        (stats.completed_cells as f64 / stats.total_cells as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Cell success rate: {:.1}% ({} / {} cells)",
        cell_success_rate, stats.completed_cells, stats.total_cells
    );
    println!(
        "Search time: {:.1}s, total time: {:.1}s",
        stats.search_seconds, stats.total_seconds
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_serialize() {
        let stats = CollectionStatistics {
            total_cells: 10,
            completed_cells: 9,
            failed_cells: 1,
            total_collected: 150,
            duplicates_removed: 40,
            filtered_outside_boundary: 12,
            ..Default::default()
        };

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["total_cells"], 10);
        assert_eq!(json["duplicates_removed"], 40);
    }
}
