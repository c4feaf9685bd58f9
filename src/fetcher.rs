// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Downloads repository logos into the raw image directory.
///
/// Logos are stored as `{owner}_{name}.{ext}`. A repository that already has
/// a stored logo under any allowed extension is reused without touching the
/// network, so an interrupted run resumes where it stopped.
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    config::LocatorTables,
    locator::{ContentSource, LogoLocator},
    progress::batch_bar,
    record::RepositoryRecord,
};

/// Locates and stores a logo for every repository.
///
/// Returns the repositories that ended up with a stored logo, enriched with
/// `image_path` and `logo_ext`, in input order. Repositories without a logo
/// and logos that cannot be written are skipped.
pub async fn download_logos<S: ContentSource,>(
    locator: &LogoLocator<S,>,
    repositories: &[RepositoryRecord],
    output_dir: &Path,
    delay: Duration,
) -> Vec<RepositoryRecord,>
{
    let bar = batch_bar(repositories.len(), "Downloading logos",);
    let mut stored = Vec::with_capacity(repositories.len(),);

    for repository in repositories {
        bar.set_message(repository.full_name.clone(),);
        let stem = repository.logo_stem();

        if let Some((path, extension,),) = existing_logo(output_dir, &stem, locator.tables(),) {
            debug!("Reusing {} for {}", path.display(), repository);
            stored.push(repository.clone().with_logo(&path, &extension,),);
            bar.inc(1,);
            continue;
        }

        match locator.locate(&repository.owner, &repository.name,).await {
            Some(logo,) => {
                let path = output_dir.join(format!("{stem}.{}", logo.extension),);
                if save_logo(&logo.bytes, &path,) {
                    stored.push(repository.clone().with_logo(&path, &logo.extension,),);
                }
            }
            None => debug!("No logo found for {}", repository),
        }

        bar.inc(1,);
        sleep(delay,).await;
    }

    bar.finish_with_message(format!("{} logos stored", stored.len()),);
    info!("Stored logos for {} of {} repositories", stored.len(), repositories.len());
    stored
}

/// Previously stored logo for `stem`, probing the allowed extensions in order.
fn existing_logo(
    output_dir: &Path,
    stem: &str,
    tables: &LocatorTables,
) -> Option<(PathBuf, String,),>
{
    tables.image_extensions.iter().find_map(|extension| {
        let path = output_dir.join(format!("{stem}.{extension}"),);
        path.is_file().then(|| (path, extension.clone(),),)
    },)
}

/// Writes `bytes` to `path`, creating parent directories. Failures are logged
/// and reported as `false`.
pub fn save_logo(bytes: &[u8], path: &Path,) -> bool
{
    if let Some(parent,) = path.parent()
        && let Err(error,) = fs::create_dir_all(parent,)
    {
        warn!("Failed to create {}: {}", parent.display(), error);
        return false;
    }

    match fs::write(path, bytes,) {
        Ok((),) => true,
        Err(error,) => {
            warn!("Error saving to {}: {}", path.display(), error);
            false
        }
    }
}
