//! Object URLs backing the download links.
//!
//! Each visible export gets one `blob:` URL. The URL is revoked as soon as
//! its export is superseded by a newer run or hidden by a new file choice.

use std::collections::HashMap;

use cfu_csv::{ArtifactRole, DownloadArtifact, Session};
use wasm_bindgen::JsValue;
use web_sys::{Blob, BlobPropertyBag, Url};

struct Link {
    revision: u64,
    url: String,
}

/// Live object URLs, one per export role.
#[derive(Default)]
pub struct DownloadLinks {
    links: HashMap<ArtifactRole, Link>,
}

impl DownloadLinks {
    /// Bring the URLs in line with the exports the session currently offers.
    pub fn sync<C>(&mut self, session: &Session<C>) {
        for role in ArtifactRole::ALL {
            let Some(artifact) = session.artifact(role) else {
                self.release(role);
                continue;
            };
            if self
                .links
                .get(&role)
                .is_some_and(|link| link.revision == artifact.revision)
            {
                continue;
            }

            self.release(role);
            match object_url(artifact) {
                Ok(url) => {
                    self.links.insert(
                        role,
                        Link {
                            revision: artifact.revision,
                            url,
                        },
                    );
                }
                Err(e) => log::error!("could not create download link for {role}: {e:?}"),
            }
        }
    }

    pub fn href(&self, role: ArtifactRole) -> Option<&str> {
        self.links.get(&role).map(|link| link.url.as_str())
    }

    fn release(&mut self, role: ArtifactRole) {
        if let Some(link) = self.links.remove(&role) {
            let _ = Url::revoke_object_url(&link.url);
        }
    }
}

/// Wrap an export in a CSV blob and return its object URL.
pub fn object_url(artifact: &DownloadArtifact) -> Result<String, JsValue> {
    let parts = js_sys::Array::new();
    parts.push(&JsValue::from_str(&artifact.content));

    let options = BlobPropertyBag::new();
    options.set_type(artifact.media_type());

    let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
    Url::create_object_url_with_blob(&blob)
}
