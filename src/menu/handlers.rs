use crate::component::TimelineWorkbench;
use crate::config::Config;
use crate::pause;
use anyhow::Result;
use console::{Term, style};
use rust_i18n::t;

fn report(result: Result<()>) {
    if let Err(e) = result {
        eprintln!("{} {e:#}", style(t!("common.error_prefix")).red().bold());
    }
}

pub fn run_folder_scan(
    term: &Term,
    workbench: &mut TimelineWorkbench,
    config: &mut Config,
) -> Result<()> {
    report(workbench.scan_folder(config));
    pause(term)
}

pub fn run_csv_import(term: &Term, workbench: &mut TimelineWorkbench) -> Result<()> {
    report(workbench.import_from_prompt());
    pause(term)
}

pub fn run_timeline_view(term: &Term, workbench: &TimelineWorkbench) -> Result<()> {
    workbench.print_timeline();
    pause(term)
}

pub fn run_gap_threshold(
    term: &Term,
    workbench: &mut TimelineWorkbench,
    config: &mut Config,
) -> Result<()> {
    report(workbench.change_gap_threshold(config));
    pause(term)
}

pub fn run_event_export(term: &Term, workbench: &TimelineWorkbench, config: &Config) -> Result<()> {
    report(workbench.export_events(config));
    pause(term)
}
