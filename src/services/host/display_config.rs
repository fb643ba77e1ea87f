use super::shared::SharedState;
use crate::error::Result;
use crate::events::{MonitorProvider, Signal};
use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use zbus::names::BusName;
use zbus::{Connection, Proxy};

const SERVICE: &str = "org.gnome.Mutter.DisplayConfig";
const PATH: &str = "/org/gnome/Mutter/DisplayConfig";

/// Слушатель D-Bus сигнала MonitorsChanged от Mutter
pub struct DisplayConfigListener {
    connection: Connection,
}

impl DisplayConfigListener {
    /// Подключиться, только если у имени сервиса есть владелец на шине сессии
    pub async fn probe() -> Result<Option<Self>> {
        let connection = Connection::session().await?;

        let dbus = zbus::fdo::DBusProxy::new(&connection).await?;
        let name = BusName::try_from(SERVICE).map_err(zbus::Error::from)?;
        if !dbus.name_has_owner(name).await.map_err(zbus::Error::from)? {
            debug!("{} отсутствует на шине сессии", SERVICE);
            return Ok(None);
        }

        info!("Найден {} на шине сессии", SERVICE);
        Ok(Some(Self { connection }))
    }

    /// Пересылать MonitorsChanged в очередь событий, пока есть подписка
    pub async fn spawn(self, shared: Arc<SharedState>) -> Result<JoinHandle<()>> {
        let proxy = Proxy::new(&self.connection, SERVICE, PATH, SERVICE).await?;
        let mut stream = proxy.receive_signal("MonitorsChanged").await?;
        // До запуска задачи, иначе ранний provider_lost был бы перезаписан
        shared.provider_ready(MonitorProvider::DisplayConfig);

        Ok(tokio::spawn(async move {
            // Соединение должно жить, пока идёт поток сигналов
            let _connection = self.connection;
            while stream.next().await.is_some() {
                if !shared.emit(Signal::MonitorsChanged(MonitorProvider::DisplayConfig)) {
                    debug!("MonitorsChanged получен без подписки");
                }
            }
            warn!("Поток сигналов {} завершился", SERVICE);
            shared.provider_lost(MonitorProvider::DisplayConfig);
        }))
    }
}
