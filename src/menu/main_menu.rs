use crate::component::TimelineWorkbench;
use crate::config::save::save_settings;
use crate::config::types::{Config, Language};
use crate::menu::handlers::{
    run_csv_import, run_event_export, run_folder_scan, run_gap_threshold, run_timeline_view,
};
use anyhow::Result;
use console::{Term, style};
use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;
use rust_i18n::t;

pub fn show_main_menu(
    term: &Term,
    workbench: &mut TimelineWorkbench,
    config: &mut Config,
) -> Result<bool> {
    term.clear_screen()?;

    println!("{}", style(t!("main_menu.title")).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());

    let options = vec![
        t!("main_menu.opt_scan"),
        t!("main_menu.opt_import"),
        t!("main_menu.opt_view"),
        t!("main_menu.opt_gap"),
        t!("main_menu.opt_export"),
        t!("main_menu.opt_settings"),
        t!("main_menu.exit"),
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("main_menu.prompt"))
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    match selection {
        Some(0) => {
            run_folder_scan(term, workbench, config)?;
            Ok(true)
        }
        Some(1) => {
            run_csv_import(term, workbench)?;
            Ok(true)
        }
        Some(2) => {
            run_timeline_view(term, workbench)?;
            Ok(true)
        }
        Some(3) => {
            run_gap_threshold(term, workbench, config)?;
            Ok(true)
        }
        Some(4) => {
            run_event_export(term, workbench, config)?;
            Ok(true)
        }
        Some(5) => {
            show_settings_menu(term, config)?;
            Ok(true)
        }
        Some(6) | None => Ok(false),
        _ => unreachable!(),
    }
}

/// 設定選單
fn show_settings_menu(term: &Term, config: &mut Config) -> Result<()> {
    loop {
        term.clear_screen()?;

        println!("{}", style(t!("settings.title")).cyan().bold());
        println!("{}", style(t!("common.esc_hint")).dim());
        println!(
            "\n{} {}",
            style(t!("settings.output_directory")).dim(),
            config.settings.output_directory.display()
        );
        println!();

        let options = vec![t!("settings.opt_language"), t!("settings.back")];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(t!("settings.prompt"))
            .items(&options)
            .default(0)
            .interact_on_opt(term)?;

        match selection {
            Some(0) => show_language_menu(term, config)?,
            Some(1) | None => break,
            _ => unreachable!(),
        }
    }

    Ok(())
}

/// 語言設定選單
fn show_language_menu(term: &Term, config: &mut Config) -> Result<()> {
    term.clear_screen()?;

    println!("{}", style(t!("settings.language.title")).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());

    let languages = [Language::EnUs, Language::ZhTw];

    let items: Vec<String> = languages.iter().map(ToString::to_string).collect();

    let default_index = languages
        .iter()
        .position(|&l| l == config.settings.language)
        .unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("settings.language.prompt"))
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    // ESC 直接返回，不儲存
    let Some(selection) = selection else {
        return Ok(());
    };

    let selected_lang = languages[selection];

    if selected_lang != config.settings.language {
        config.settings.language = selected_lang;
        rust_i18n::set_locale(selected_lang.as_str());
        save_settings(&config.settings)?;
        println!(
            "\n{} {}",
            style(t!("settings.saved")).green(),
            selected_lang
        );
        std::thread::sleep(std::time::Duration::from_secs(1));
    }

    Ok(())
}
