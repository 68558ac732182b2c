//! Main application component.

use std::cell::RefCell;
use std::rc::Rc;

use cfu_csv::{ArtifactRole, CfuConverter, Delimiter, Session, SourceInfo};
use gloo::timers::future::TimeoutFuture;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::components::{DownloadLink, DownloadPanel, LogPanel, SourcePanel};
use crate::download::DownloadLinks;

type SharedSession = Rc<RefCell<Session<CfuConverter>>>;

/// Read the whole file into memory.
async fn read_bytes(file: Option<web_sys::File>) -> Result<Vec<u8>, String> {
    let Some(file) = file else {
        return Err("Aucun fichier sélectionné".to_string());
    };
    let file = gloo::file::File::from(file);
    gloo::file::futures::read_as_bytes(&file)
        .await
        .map_err(|e| e.to_string())
}

/// Main application component.
#[function_component(App)]
pub fn app() -> Html {
    let session: SharedSession = use_mut_ref(Session::new);
    let links = use_mut_ref(DownloadLinks::default);
    let selected = use_mut_ref(|| None::<web_sys::File>);
    let delimiter = use_state(Delimiter::default);
    let update = use_force_update();

    {
        let session = session.clone();
        let update = update.clone();
        use_effect_with((), move |_| {
            session.borrow_mut().bootstrap(CfuConverter::load());
            update.force_update();
            || ()
        });
    }

    let on_file_change = {
        let session = session.clone();
        let links = links.clone();
        let selected = selected.clone();
        let update = update.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let file = input.files().and_then(|files| files.get(0));
            let info = file
                .as_ref()
                .map(|f| SourceInfo::new(f.name(), f.size() as u64));
            *selected.borrow_mut() = file;
            {
                let mut session = session.borrow_mut();
                session.select_file(info);
                links.borrow_mut().sync(&session);
            }
            update.force_update();
        })
    };

    let on_delimiter_change = {
        let delimiter = delimiter.clone();
        Callback::from(move |d: Delimiter| delimiter.set(d))
    };

    let on_run = {
        let session = session.clone();
        let links = links.clone();
        let selected = selected.clone();
        let update = update.clone();
        let delimiter = *delimiter;
        Callback::from(move |_: ()| {
            let started = session.borrow_mut().start_run(delimiter);
            update.force_update();
            let ticket = match started {
                Ok(ticket) => ticket,
                Err(e) => {
                    log::debug!("run rejected: {e}");
                    return;
                }
            };

            let file = selected.borrow().clone();
            let session = session.clone();
            let links = links.clone();
            let update = update.clone();
            spawn_local(async move {
                let read = read_bytes(file).await;
                if read.is_ok() {
                    session.borrow_mut().begin_conversion(&ticket);
                    update.force_update();
                    // Yield so the status line renders before converting.
                    TimeoutFuture::new(0).await;
                }
                {
                    let mut session = session.borrow_mut();
                    session.complete(ticket, read);
                    links.borrow_mut().sync(&session);
                }
                update.force_update();
            });
        })
    };

    let current = session.borrow();
    let download_links: Vec<DownloadLink> = {
        let links = links.borrow();
        ArtifactRole::ALL
            .into_iter()
            .filter_map(|role| {
                links.href(role).map(|href| DownloadLink {
                    filename: role.filename(),
                    href: href.to_string(),
                })
            })
            .collect()
    };

    html! {
        <div class="app">
            <header class="header">
                <h1>{ "CFU budgétaire → CSV (brut et SCDL)" }</h1>
            </header>

            <main class="main">
                <SourcePanel
                    source={current.source().cloned()}
                    delimiter={*delimiter}
                    run_enabled={current.can_run()}
                    busy={current.is_busy()}
                    on_file_change={on_file_change}
                    on_delimiter_change={on_delimiter_change}
                    on_run={on_run}
                />
                <LogPanel text={current.log_text()} />
                <DownloadPanel links={download_links} />
            </main>

            <footer class="footer">
                <span>{ "Conversion locale dans le navigateur | UTF-8" }</span>
                <span class="footer-build">
                    { format!("Build: {}@{} {}", env!("BUILD_HOST"), env!("BUILD_COMMIT"), env!("BUILD_TIMESTAMP")) }
                </span>
            </footer>
        </div>
    }
}
