use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Extension, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use dashmap::DashMap;
use futures::stream::{SplitSink, SplitStream};
use futures::{Sink, SinkExt, Stream, StreamExt};
use montyhall::*;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

type Outgoing = SplitSink<WebSocket, Message>;
type Incoming = SplitStream<WebSocket>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let server = Server::new(&config);

    // 定期清理过期的断线会话
    let sweeper = server.clone();
    tokio::spawn(async move {
        let mut ticker = interval(sweeper.ttl.max(Duration::from_secs(1)));
        loop {
            ticker.tick().await;
            sweeper.sweep();
        }
    });

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .layer(Extension(server))
        .layer(TraceLayer::new_for_http());

    info!(addr = %config.bind, "listening");
    axum::Server::bind(&config.bind)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(server): Extension<Server>,
) -> impl IntoResponse {
    ws.on_upgrade(|s| async move {
        if let Err(e) = handle_ws(s, server).await {
            error!("Websocket error: {e}");
        }
    })
}

/// 断线的会话
#[derive(Debug)]
struct Parked {
    game: Game,
    since: Instant,
}

/// 断开连接的会话暂存在这里，在 `ttl` 内可以凭会话 ID 继续
#[derive(Debug, Clone)]
struct Server {
    sessions: Arc<DashMap<Uuid, Parked>>,
    pacing: Pacing,
    mode: Mode,
    ttl: Duration,
}

impl Server {
    fn new(config: &Config) -> Self {
        Self {
            sessions: Default::default(),
            pacing: config.pacing(),
            mode: config.mode(),
            ttl: config.session_ttl(),
        }
    }

    fn park(&self, id: Uuid, game: Game) {
        let parked = Parked {
            game,
            since: Instant::now(),
        };
        self.sessions.insert(id, parked);
        info!(%id, "session parked");
    }

    /// 丢弃所有过期会话
    fn sweep(&self) {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, parked| parked.since.elapsed() < self.ttl);
        let dropped = before.saturating_sub(self.sessions.len());
        if dropped > 0 {
            info!(dropped, "expired sessions dropped");
        }
    }
}

async fn handle_ws(socket: WebSocket, server: Server) -> anyhow::Result<()> {
    let (mut outgoing, mut incoming) = socket.split();
    let mut session = None;
    let result = serve(&mut outgoing, &mut incoming, &server, &mut session).await;

    // 无论连接如何结束，都把游戏放回去
    if let Some((id, table)) = session {
        server.park(id, table.into_game());
    }
    result
}

async fn serve(
    outgoing: &mut Outgoing,
    incoming: &mut Incoming,
    server: &Server,
    session: &mut Option<(Uuid, Table)>,
) -> anyhow::Result<()> {
    while let Some(message) = incoming.next().await.transpose()? {
        match message {
            Message::Text(text) => {
                let request: GameRequest = match serde_json::from_str(&text) {
                    Ok(request) => request,
                    Err(e) => {
                        warn!("bad request: {e}");
                        let cause = ServerError::BadRequest {
                            reason: e.to_string(),
                        };
                        send(outgoing, &GameResponse::ServerError { cause }).await?;
                        continue;
                    }
                };

                if let GameRequest::Join { session: id } = request {
                    let response = if session.is_some() {
                        GameResponse::GameError {
                            cause: Error::InvalidState,
                        }
                    } else {
                        match join(server, id) {
                            Ok((id, game)) => {
                                let table = Table::new(game, server.pacing);
                                let response = GameResponse::Joined {
                                    session: id,
                                    round: table.game().round().view(),
                                    statistics: table.game().statistics(),
                                };
                                *session = Some((id, table));
                                response
                            }
                            Err(cause) => GameResponse::ServerError { cause },
                        }
                    };
                    send(outgoing, &response).await?;
                    continue;
                }

                match session {
                    Some((_, table)) => handle_request(outgoing, incoming, table, request).await?,
                    None => {
                        let cause = ServerError::NotJoined;
                        send(outgoing, &GameResponse::ServerError { cause }).await?;
                    }
                }
            }
            Message::Close(c) => {
                match c {
                    Some(c) => info!(code = c.code, reason = %c.reason, "connection closed"),
                    None => info!("connection closed without close frame"),
                }
                break;
            }
            _ => {}
        }
    }

    Ok(())
}

fn join(server: &Server, id: Option<Uuid>) -> std::result::Result<(Uuid, Game), ServerError> {
    match id {
        Some(id) => {
            let (id, parked) = server
                .sessions
                .remove(&id)
                .ok_or(ServerError::SessionNotFound { id })?;
            if parked.since.elapsed() >= server.ttl {
                info!(%id, "session expired");
                return Err(ServerError::SessionNotFound { id });
            }
            info!(%id, "session resumed");
            Ok((id, parked.game))
        }
        None => {
            let id = Uuid::new_v4();
            info!(%id, "session created");
            Ok((id, Game::new(server.mode)))
        }
    }
}

async fn handle_request(
    outgoing: &mut Outgoing,
    incoming: &mut Incoming,
    table: &mut Table,
    request: GameRequest,
) -> anyhow::Result<()> {
    let response = match request {
        GameRequest::Join { .. } => GameResponse::GameError {
            cause: Error::InvalidState,
        },
        GameRequest::NewRound => GameResponse::RoundStarted {
            round: table.game_mut().new_round(),
        },
        GameRequest::Select { door } => match table.select_door(door) {
            Ok(()) => {
                send(outgoing, &GameResponse::Selected { door }).await?;
                match suspend(outgoing, incoming, table.reveal()).await? {
                    Ok(reveal) => GameResponse::Revealed { reveal },
                    Err(cause) => GameResponse::GameError { cause },
                }
            }
            Err(cause) => GameResponse::GameError { cause },
        },
        GameRequest::Decide { strategy } => match table.decide(strategy) {
            Ok(decision) => {
                let statistics = table.game().statistics();
                send(outgoing, &GameResponse::Decided { decision, statistics }).await?;
                if !decision.is_retry() {
                    return Ok(());
                }
                match suspend(outgoing, incoming, table.restart_after_retry()).await? {
                    Ok(round) => GameResponse::Restarted { round },
                    Err(cause) => GameResponse::GameError { cause },
                }
            }
            Err(cause) => GameResponse::GameError { cause },
        },
        GameRequest::Statistics => GameResponse::Statistics {
            statistics: table.game().statistics(),
        },
        GameRequest::ResetStatistics => {
            table.game_mut().reset_statistics();
            GameResponse::Statistics {
                statistics: table.game().statistics(),
            }
        }
        GameRequest::SetMode { retry_enabled } => {
            let round = table.game_mut().set_mode(retry_enabled);
            GameResponse::ModeChanged {
                round,
                statistics: table.game().statistics(),
            }
        }
        GameRequest::ToggleMode => {
            let round = table.game_mut().toggle_mode();
            GameResponse::ModeChanged {
                round,
                statistics: table.game().statistics(),
            }
        }
    };

    send(outgoing, &response).await
}

/// 等待揭示或重来的延迟结束；期间收到的请求一律以 `InvalidState` 拒绝，不会排队到延迟之后
async fn suspend<T, F, S, K>(outgoing: &mut K, incoming: &mut S, pending: F) -> anyhow::Result<T>
where
    F: Future<Output = T>,
    S: Stream<Item = std::result::Result<Message, axum::Error>> + Unpin,
    K: Sink<Message> + Unpin,
    K::Error: std::error::Error + Send + Sync + 'static,
{
    tokio::pin!(pending);
    loop {
        tokio::select! {
            output = &mut pending => return Ok(output),
            message = incoming.next() => match message {
                Some(Ok(Message::Text(_))) => {
                    debug!("request rejected while suspended");
                    let cause = Error::InvalidState;
                    send(outgoing, &GameResponse::GameError { cause }).await?;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                // 连接已断开，只等延迟结束
                None => return Ok((&mut pending).await),
            },
        }
    }
}

async fn send<K>(outgoing: &mut K, response: &GameResponse) -> anyhow::Result<()>
where
    K: Sink<Message> + Unpin,
    K::Error: std::error::Error + Send + Sync + 'static,
{
    outgoing
        .send(Message::Text(serde_json::to_string(response)?))
        .await?;
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action")]
enum GameRequest {
    Join { session: Option<Uuid> },
    NewRound,
    Select { door: usize },
    Decide { strategy: Strategy },
    Statistics,
    ResetStatistics,
    SetMode { retry_enabled: bool },
    ToggleMode,
}

#[derive(thiserror::Error, Debug, Serialize, Deserialize)]
enum ServerError {
    #[error("Session not found: {}", .id)]
    SessionNotFound { id: Uuid },
    #[error("Join a session first")]
    NotJoined,
    #[error("Bad request: {}", .reason)]
    BadRequest { reason: String },
}

#[derive(Debug, Serialize)]
#[serde(tag = "resp")]
enum GameResponse {
    Joined {
        session: Uuid,
        round: RoundView,
        statistics: StatisticsReport,
    },
    RoundStarted {
        round: RoundView,
    },
    Selected {
        door: usize,
    },
    Revealed {
        reveal: Reveal,
    },
    Decided {
        decision: Decision,
        statistics: StatisticsReport,
    },
    Restarted {
        round: RoundView,
    },
    Statistics {
        statistics: StatisticsReport,
    },
    ModeChanged {
        round: RoundView,
        statistics: StatisticsReport,
    },
    GameError {
        cause: Error,
    },
    ServerError {
        cause: ServerError,
    },
}
