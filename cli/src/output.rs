// Console rendering for disks, GPT entries and logs

use diskmgmt_core::disk::alloc_ops::format_size;
use diskmgmt_core::disk::gpt::partition_entries;
use diskmgmt_core::logger::LogEntry;
use diskmgmt_core::{Disk, DiskRegistry, Extent};
use gpt_disk_types::BlockSize;

pub fn print_disks(registry: &DiskRegistry) {
    for disk in registry.disks() {
        print_disk(disk, registry.selected());
        println!();
    }
}

pub fn print_disk(disk: &Disk, selected: Option<diskmgmt_core::ExtentId>) {
    println!(
        "{} ({}, {}) {}  total {}  free {}",
        disk.id,
        disk.name,
        disk.kind.name(),
        if disk.online { "Online" } else { "Offline" },
        format_size(disk.total_mb),
        format_size(disk.free_mb()),
    );
    println!(
        "  {:1} {:>4}  {:<14} {:<3} {:<16} {:<6} {:>12} {:>12}",
        "", "ID", "Type", "Ltr", "Label", "FS", "Offset", "Size"
    );

    for (start_mb, extent) in disk.extents.layout() {
        let marker = if selected == Some(extent.id) { "*" } else { "" };
        println!(
            "  {:1} {:>4}  {:<14} {:<3} {:<16} {:<6} {:>12} {:>12}{}",
            marker,
            extent.id,
            extent.type_name(),
            letter(extent),
            extent.label,
            if extent.is_free() { "" } else { extent.filesystem.name() },
            format_size(start_mb),
            format_size(extent.size_mb),
            flags(extent),
        );
    }
}

fn letter(extent: &Extent) -> String {
    extent
        .drive_letter
        .map(|l| l.to_string())
        .unwrap_or_default()
}

fn flags(extent: &Extent) -> &'static str {
    match (extent.is_system, extent.is_boot) {
        (true, true) => "  [system, boot]",
        (true, false) => "  [system]",
        _ => "",
    }
}

pub fn print_gpt(disk: &Disk) {
    let entries = partition_entries(&disk.extents, BlockSize::BS_512);
    if entries.is_empty() {
        println!("{} has no partitions.", disk.id);
        return;
    }

    for (index, entry) in entries.iter().enumerate() {
        println!("Partition {}: {}", index + 1, entry.name);
        println!("  type   {}", { entry.partition_type_guid });
        println!("  guid   {}", { entry.unique_partition_guid });
        println!(
            "  lba    {}..={}",
            entry.starting_lba.to_u64(),
            entry.ending_lba.to_u64()
        );
    }
}

pub fn print_logs(entries: &[LogEntry]) {
    if entries.is_empty() {
        println!("No log records.");
    }
    for entry in entries {
        println!("[{:<5}] {}: {}", entry.level, entry.target, entry.message);
    }
}
