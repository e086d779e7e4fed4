mod commands;
mod logger;
mod sweeper;

/// Path of the default config.toml file.
const DEFAULT_CONFIG: &str = "./config.toml";

use commands::Bindings;
use reactrole::model::id::UserId;
use reactrole_core::config::Config;
use reactrole_core::store;
use reactrole_core::temprole::TempRoles;

use async_trait::async_trait;
use clap::{App, Arg};
use parking_lot::RwLock;
use serenity::client::{bridge::gateway::GatewayIntents, Client, Context, EventHandler};
use serenity::model::channel::{Message, Reaction};
use serenity::model::gateway::Ready;

use std::sync::Arc;

#[tokio::main]
async fn main() {
    let matches = App::new("reactrole")
        .version("0.1.0")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Provide a path to the config file")
                .takes_value(true),
        )
        .get_matches();

    let config = matches.value_of("config").unwrap_or(DEFAULT_CONFIG);

    // Load the config.toml file.
    let config = Config::load(config);

    logger::init(&config);

    let store = match store::connect(&config.storage).await {
        Ok(store) => store,
        Err(err) => {
            log::error!("[CORE] Failed to connect store: {}", err);
            log::error!("[CORE] Fatal error, exiting");
            std::process::exit(1);
        }
    };

    let temp_roles = Arc::new(TempRoles::new(store));

    let gateway_intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MESSAGE_REACTIONS;

    log::info!("[BOT] Connecting");

    let mut client = Client::builder(&config.token)
        .intents(gateway_intents)
        .event_handler(Handler {
            temp_roles: temp_roles.clone(),
            bindings: Bindings::default(),
            bot_user: RwLock::new(None),
        })
        .await
        .unwrap();

    let http = client.cache_and_http.http.clone();
    tokio::task::spawn(sweeper::run(http, temp_roles, config.sweep_interval));

    client.start().await.unwrap();
}

pub struct Handler {
    pub temp_roles: Arc<TempRoles>,
    pub bindings: Bindings,
    pub bot_user: RwLock<Option<UserId>>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, message: Message) {
        commands::handle_message(&ctx, &message, self).await;
    }

    async fn reaction_add(&self, ctx: Context, reaction: Reaction) {
        commands::reaction_add(&ctx, &reaction, self).await;
    }

    async fn reaction_remove(&self, ctx: Context, reaction: Reaction) {
        commands::reaction_remove(&ctx, &reaction, self).await;
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        log::info!("[BOT] Bot online");

        *self.bot_user.write() = Some(UserId::from(ready.user.id));
    }
}
