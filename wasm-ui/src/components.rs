//! UI Components for the converter page.

use cfu_csv::{Delimiter, SourceInfo};
use web_sys::HtmlSelectElement;
use yew::prelude::*;

/// File picker, separator choice and run button.
#[derive(Properties, PartialEq)]
pub struct SourcePanelProps {
    pub source: Option<SourceInfo>,
    pub delimiter: Delimiter,
    pub run_enabled: bool,
    pub busy: bool,
    pub on_file_change: Callback<Event>,
    pub on_delimiter_change: Callback<Delimiter>,
    pub on_run: Callback<()>,
}

#[function_component(SourcePanel)]
pub fn source_panel(props: &SourcePanelProps) -> Html {
    let on_select = {
        let on_delimiter_change = props.on_delimiter_change.clone();
        Callback::from(move |e: Event| {
            let target: HtmlSelectElement = e.target_unchecked_into();
            on_delimiter_change.emit(target.value().parse().unwrap_or_default());
        })
    };

    let on_run_click = {
        let on_run = props.on_run.clone();
        Callback::from(move |_| {
            on_run.emit(());
        })
    };

    html! {
        <div class="panel source-panel">
            <div class="panel-header">
                <h2>{ "Fichier CFU" }</h2>
                if let Some(source) = &props.source {
                    <span class="source-info">
                        { format!("{} ({})", source.name, source.size_label()) }
                    </span>
                }
            </div>
            <div class="panel-content">
                <input
                    type="file"
                    accept=".xml,application/xml,text/xml"
                    onchange={props.on_file_change.clone()}
                />
                <label>
                    { "Séparateur " }
                    <select onchange={on_select}>
                        { for Delimiter::ALL.iter().map(|d| html! {
                            <option value={d.name()} selected={*d == props.delimiter}>
                                { d.label() }
                            </option>
                        }) }
                    </select>
                </label>
                <button class="run-button" disabled={!props.run_enabled} onclick={on_run_click}>
                    { if props.busy { "Conversion…" } else { "Convertir" } }
                </button>
            </div>
        </div>
    }
}

/// Status log.
#[derive(Properties, PartialEq)]
pub struct LogPanelProps {
    pub text: String,
}

#[function_component(LogPanel)]
pub fn log_panel(props: &LogPanelProps) -> Html {
    html! {
        <div class="panel log-panel">
            <div class="panel-header">
                <h2>{ "Journal" }</h2>
            </div>
            <pre class="log">{ &props.text }</pre>
        </div>
    }
}

/// One export offered for download.
#[derive(Clone, PartialEq)]
pub struct DownloadLink {
    pub filename: &'static str,
    pub href: String,
}

#[derive(Properties, PartialEq)]
pub struct DownloadPanelProps {
    pub links: Vec<DownloadLink>,
}

#[function_component(DownloadPanel)]
pub fn download_panel(props: &DownloadPanelProps) -> Html {
    if props.links.is_empty() {
        return html! {};
    }

    html! {
        <div class="panel download-panel">
            <div class="panel-header">
                <h2>{ "Exports" }</h2>
            </div>
            <div class="panel-content">
                { for props.links.iter().map(|link| html! {
                    <a class="download-link" href={link.href.clone()} download={link.filename}>
                        { link.filename }
                    </a>
                }) }
            </div>
        </div>
    }
}
