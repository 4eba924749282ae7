pub const CREDENTIALS: &str = r#"# This file contains the credentials for the voice & chat platforms
# which your bot is using.
# https://rasa.com/docs/rasa/messaging-and-voice-channels/

rest:
#  # you don't need to provide anything here - this channel doesn't
#  # require any credentials

#facebook:
#  verify: "<verify>"
#  secret: "<your secret>"
#  page-access-token: "<your page access token>"

#slack:
#  slack_token: "<your slack token>"
#  slack_channel: "<the slack channel>"
#  slack_signing_secret: "<your slack signing secret>"

#socketio:
#  user_message_evt: <event name for user message>
#  bot_message_evt: <event name for bot message>
#  session_persistence: <true/false>

#mattermost:
#  url: "https://<mattermost instance>/api/v4"
#  token: "<bot token>"
#  webhook_url: "<callback URL>"
"#;

const ENDPOINTS_HEAD: &str = r#"# This file contains the different endpoints your bot can use.

# Server where the models are pulled from.
# https://rasa.com/docs/rasa/model-storage#fetching-models-from-a-server

#models:
#  url: http://my-server.com/models/default_core@latest
#  wait_time_between_pulls:  10   # [optional](default: 100)

# Server which runs your custom actions.
# https://rasa.com/docs/rasa/custom-actions

"#;

const ENDPOINTS_TAIL: &str = r#"
# Tracker store which is used to store the conversations.
# By default the conversations are stored in memory.
# https://rasa.com/docs/rasa/tracker-stores

#tracker_store:
#    type: redis
#    url: <host of the redis instance>
#    port: <port of your redis instance>
#    username: <username used for authentication>
#    password: <password used for authentication>
#    db: <number of your database within redis>

# Event broker which all conversation events should be streamed to.
# https://rasa.com/docs/rasa/event-brokers

#event_broker:
#  type: pika
#  url: localhost
#  username: username
#  password: password
#  queue: queue
"#;

/// `endpoints.yml`, with `action_endpoint` active only when a URL is given.
pub fn endpoints(action_endpoint: Option<&str>) -> String {
    let action = match action_endpoint {
        Some(url) => format!("action_endpoint:\n  url: \"{}\"\n", url.replace('"', "\\\"")),
        None => "#action_endpoint:\n#  url: \"http://localhost:5055/webhook\"\n".to_string(),
    };
    format!("{}{}{}", ENDPOINTS_HEAD, action, ENDPOINTS_TAIL)
}
